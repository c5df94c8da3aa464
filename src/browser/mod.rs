//! Browser automation boundary
//!
//! The step engine talks to a [`Driver`]; [`BrowserSession`] implements it
//! over the Chrome DevTools Protocol via chromiumoxide.

pub mod driver;
pub mod locator;
pub mod session;

pub use driver::{Driver, ResponseWatch};
pub use locator::Locator;
pub use session::BrowserSession;
