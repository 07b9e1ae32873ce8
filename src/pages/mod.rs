//! Page objects: one struct per site area, holding the selectors and the
//! small interaction sequences the flows compose.

pub mod cart;
pub mod designer;
pub mod login;
pub mod register;

pub use cart::CartPage;
pub use designer::DesignerPage;
pub use login::LoginPage;
pub use register::RegisterPage;
