//! Parsing and validation of `icepick.toml` platform descriptions.
//!
//! A platform file names the target device and package, the default clock
//! and reset selectors, and the physical pins behind each named resource.
//! [`load_config`] produces a validated [`PlatformConfig`], and
//! [`resolve_resource`] turns one resource into the shape the lowering engine
//! binds against.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_resource, ResolvedPins, ResolvedResource};
pub use types::*;
