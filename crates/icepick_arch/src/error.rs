//! Error types for profile lookup.

/// Errors raised while selecting a family profile.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchError {
    /// The device is not in the device table.
    #[error("unknown device '{0}'")]
    UnknownDevice(String),
}
