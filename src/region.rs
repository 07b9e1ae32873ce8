use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use url::Url;

/// Target environment for a run. QA and live differ only in the host prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TestEnv {
    Qa,
    Live,
}

impl TestEnv {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestEnv::Qa => "qa",
            TestEnv::Live => "live",
        }
    }
}

impl fmt::Display for TestEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Localized UI strings asserted against by the page objects.
pub struct UiStrings {
    pub greeting: &'static str,
    pub sign_in: &'static str,
    pub sign_out: &'static str,
    pub add_to_basket: &'static str,
    pub invalid_credentials: &'static str,
}

/// One storefront region. Immutable, registered in [`REGIONS`].
pub struct RegionConfig {
    pub code: &'static str,
    pub name: &'static str,
    pub domain: &'static str,
    pub site_id: &'static str,
    pub locale: &'static str,
    pub currency: &'static str,
    pub strings: UiStrings,
}

impl RegionConfig {
    pub fn base_url(&self, env: TestEnv) -> String {
        match env {
            TestEnv::Qa => format!("https://qa.{}", self.domain),
            TestEnv::Live => format!("https://www.{}", self.domain),
        }
    }
}

pub static REGIONS: &[RegionConfig] = &[
    RegionConfig {
        code: "UK",
        name: "United Kingdom",
        domain: "printshop.co.uk",
        site_id: "ps-uk",
        locale: "en-GB",
        currency: "GBP",
        strings: UiStrings {
            greeting: "Hello",
            sign_in: "Sign in",
            sign_out: "Sign out",
            add_to_basket: "Add to basket",
            invalid_credentials: "Your email or password is incorrect",
        },
    },
    RegionConfig {
        code: "DE",
        name: "Germany",
        domain: "printshop.de",
        site_id: "ps-de",
        locale: "de-DE",
        currency: "EUR",
        strings: UiStrings {
            greeting: "Hallo",
            sign_in: "Anmelden",
            sign_out: "Abmelden",
            add_to_basket: "In den Warenkorb",
            invalid_credentials: "E-Mail oder Passwort ist falsch",
        },
    },
    RegionConfig {
        code: "FR",
        name: "France",
        domain: "printshop.fr",
        site_id: "ps-fr",
        locale: "fr-FR",
        currency: "EUR",
        strings: UiStrings {
            greeting: "Bonjour",
            sign_in: "Se connecter",
            sign_out: "Se déconnecter",
            add_to_basket: "Ajouter au panier",
            invalid_credentials: "E-mail ou mot de passe incorrect",
        },
    },
    RegionConfig {
        code: "NL",
        name: "Netherlands",
        domain: "printshop.nl",
        site_id: "ps-nl",
        locale: "nl-NL",
        currency: "EUR",
        strings: UiStrings {
            greeting: "Hallo",
            sign_in: "Inloggen",
            sign_out: "Uitloggen",
            add_to_basket: "In winkelwagen",
            invalid_credentials: "E-mailadres of wachtwoord is onjuist",
        },
    },
    RegionConfig {
        code: "US",
        name: "United States",
        domain: "printshop.com",
        site_id: "ps-us",
        locale: "en-US",
        currency: "USD",
        strings: UiStrings {
            greeting: "Hello",
            sign_in: "Sign in",
            sign_out: "Sign out",
            add_to_basket: "Add to cart",
            invalid_credentials: "Your email or password is incorrect",
        },
    },
];

/// Look up a region by its code, case-insensitively.
pub fn by_code(code: &str) -> Option<&'static RegionConfig> {
    REGIONS.iter().find(|r| r.code.eq_ignore_ascii_case(code))
}

/// Derive the region from a host name. Total: unknown hosts return `None`
/// rather than falling back to a default region.
pub fn parse_region_from_host(host: &str) -> Option<&'static RegionConfig> {
    static ENV_PREFIX: OnceLock<Regex> = OnceLock::new();
    let prefix = ENV_PREFIX.get_or_init(|| {
        Regex::new(r"^(?:www|qa|staging)\.").expect("valid host prefix regex")
    });

    let host = host
        .split(':')
        .next()
        .unwrap_or(host)
        .to_ascii_lowercase();
    let bare = prefix.replace(&host, "");
    REGIONS.iter().find(|r| r.domain == bare)
}

/// Derive the region from a full URL.
pub fn parse_region_from_url(url: &str) -> Option<&'static RegionConfig> {
    let parsed = Url::parse(url).ok()?;
    parse_region_from_host(parsed.host_str()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn by_code_is_case_insensitive() {
        assert_eq!(by_code("uk").map(|r| r.code), Some("UK"));
        assert_eq!(by_code("De").map(|r| r.code), Some("DE"));
    }

    #[test]
    fn by_code_unknown_is_none() {
        assert!(by_code("ZZ").is_none());
        assert!(by_code("").is_none());
    }

    #[test]
    fn base_url_per_environment() {
        let uk = by_code("UK").unwrap();
        assert_eq!(uk.base_url(TestEnv::Qa), "https://qa.printshop.co.uk");
        assert_eq!(uk.base_url(TestEnv::Live), "https://www.printshop.co.uk");
    }

    #[test]
    fn parse_host_strips_env_prefixes() {
        assert_eq!(
            parse_region_from_host("www.printshop.de").map(|r| r.code),
            Some("DE")
        );
        assert_eq!(
            parse_region_from_host("qa.printshop.co.uk").map(|r| r.code),
            Some("UK")
        );
        assert_eq!(
            parse_region_from_host("printshop.nl").map(|r| r.code),
            Some("NL")
        );
    }

    #[test]
    fn parse_host_ignores_port_and_case() {
        assert_eq!(
            parse_region_from_host("WWW.Printshop.COM:8443").map(|r| r.code),
            Some("US")
        );
    }

    #[test]
    fn parse_host_fails_closed_on_unknown_domains() {
        assert!(parse_region_from_host("example.com").is_none());
        assert!(parse_region_from_host("printshop.evil.com").is_none());
        // A prefix the regex does not know is not silently accepted either.
        assert!(parse_region_from_host("cdn.printshop.co.uk").is_none());
    }

    #[test]
    fn parse_url_uses_the_host() {
        assert_eq!(
            parse_region_from_url("https://qa.printshop.fr/photo-books?x=1").map(|r| r.code),
            Some("FR")
        );
        assert!(parse_region_from_url("not a url").is_none());
    }
}
