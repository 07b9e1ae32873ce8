use rand::Rng;

/// One entry of the static navigation-link list the monitor samples from.
pub struct NavigationLink {
    pub name: &'static str,
    pub path: &'static str,
    pub selector_hint: Option<&'static str>,
}

pub static NAV_LINKS: &[NavigationLink] = &[
    NavigationLink {
        name: "Photo Books",
        path: "/photo-books",
        selector_hint: Some("a[href*='photo-books']"),
    },
    NavigationLink {
        name: "Calendars",
        path: "/calendars",
        selector_hint: Some("a[href*='calendars']"),
    },
    NavigationLink {
        name: "Canvas Prints",
        path: "/canvas-prints",
        selector_hint: Some("a[href*='canvas-prints']"),
    },
    NavigationLink {
        name: "Posters",
        path: "/posters",
        selector_hint: None,
    },
    NavigationLink {
        name: "Prints",
        path: "/photo-prints",
        selector_hint: Some("a[href*='photo-prints']"),
    },
    NavigationLink {
        name: "Wall Art",
        path: "/wall-art",
        selector_hint: None,
    },
    NavigationLink {
        name: "Mugs",
        path: "/mugs",
        selector_hint: None,
    },
    NavigationLink {
        name: "Greeting Cards",
        path: "/cards",
        selector_hint: Some("a[href*='cards']"),
    },
    NavigationLink {
        name: "Gifts",
        path: "/gifts",
        selector_hint: None,
    },
    NavigationLink {
        name: "Offers",
        path: "/offers",
        selector_hint: None,
    },
];

/// Uniform draw with replacement. Duplicates are allowed and full coverage
/// within a run is not guaranteed.
pub fn pick_random() -> &'static NavigationLink {
    let idx = rand::thread_rng().gen_range(0..NAV_LINKS.len());
    &NAV_LINKS[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_have_absolute_paths() {
        for link in NAV_LINKS {
            assert!(link.path.starts_with('/'), "{} path", link.name);
            assert!(!link.name.is_empty());
        }
    }

    #[test]
    fn pick_random_returns_registered_links() {
        for _ in 0..100 {
            let link = pick_random();
            assert!(NAV_LINKS.iter().any(|l| l.name == link.name));
        }
    }
}
