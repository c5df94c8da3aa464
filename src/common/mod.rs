//! Common utilities shared across the runner

pub mod error;
pub mod logging;
pub mod pattern;

pub use error::{Error, Result};
pub use pattern::UrlPattern;
