pub mod cdp;
pub mod driver;
pub mod health;
pub mod popups;

pub use cdp::{BrowserSession, CdpDriver};
pub use driver::PageDriver;
