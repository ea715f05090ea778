//! Error taxonomy for lowering and reset synthesis.

use crate::codes;
use icepick_arch::ArchError;
use icepick_config::ConfigError;
use icepick_diagnostics::Diagnostic;
use icepick_ir::BuildError;

/// Errors from the platform passes. Every variant is fatal to the buffer or
/// domain being processed and is raised before that unit emits anything.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    /// A user-supplied value is outside its allowed domain.
    #[error("invalid {field} {value}: {reason}")]
    InvalidConfiguration {
        /// The offending field.
        field: String,
        /// The offending value, as written.
        value: String,
        /// What the field must be.
        reason: String,
    },

    /// A valid combination that has no safe lowering on this family.
    #[error("unsupported configuration: {reason}")]
    UnsupportedConfiguration {
        /// What is unsupported.
        reason: String,
    },

    /// A descriptor or binding of the wrong shape. Indicates a caller bug.
    #[error("type error: expected {expected}, found {found}")]
    TypeError {
        /// What was expected.
        expected: String,
        /// What was passed.
        found: String,
    },

    /// The platform description could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl PlatformError {
    pub(crate) fn invalid(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        PlatformError::InvalidConfiguration {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
        PlatformError::UnsupportedConfiguration {
            reason: reason.into(),
        }
    }

    pub(crate) fn type_error(expected: impl Into<String>, found: impl ToString) -> Self {
        PlatformError::TypeError {
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    /// Converts the error into an error-severity diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self {
            PlatformError::InvalidConfiguration { .. } => codes::INVALID_CONFIGURATION,
            PlatformError::UnsupportedConfiguration { .. } => codes::UNSUPPORTED_CONFIGURATION,
            PlatformError::TypeError { .. } => codes::TYPE_ERROR,
            PlatformError::Config(_) => codes::CONFIG_FILE,
        };
        let diag = Diagnostic::from_code(code, self.to_string());
        match self {
            PlatformError::InvalidConfiguration { field, .. } => diag.with_origin(field.clone()),
            PlatformError::TypeError { .. } => {
                diag.with_note("this is a bug in the caller, not in the platform description")
            }
            _ => diag,
        }
    }
}

impl From<ArchError> for PlatformError {
    fn from(err: ArchError) -> Self {
        match err {
            ArchError::UnknownDevice(device) => {
                PlatformError::invalid("device", device, "not an iCE40 or iCE5 device")
            }
        }
    }
}

impl From<BuildError> for PlatformError {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::NotPosedge(name) => PlatformError::invalid(
                "domain",
                name,
                "registered iCE40 I/O is clocked on the rising edge only",
            ),
            BuildError::UnknownDomain(name) => {
                PlatformError::invalid("domain", name, "no such clock domain")
            }
            BuildError::DuplicateDomain(name) => {
                PlatformError::invalid("domain", name, "clock domain already exists")
            }
            BuildError::ResetLess(name) => {
                PlatformError::invalid("domain", name, "clock domain has no reset")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icepick_diagnostics::Severity;

    #[test]
    fn display_messages() {
        let err = PlatformError::invalid("hfosc_div", 4, "must be an integer between 0 and 3");
        assert_eq!(
            err.to_string(),
            "invalid hfosc_div 4: must be an integer between 0 and 3"
        );
        let err = PlatformError::unsupported("differential bidirectional buffers");
        assert_eq!(
            err.to_string(),
            "unsupported configuration: differential bidirectional buffers"
        );
        let err = PlatformError::type_error("3 invert flags", "2 flags");
        assert_eq!(err.to_string(), "type error: expected 3 invert flags, found 2 flags");
    }

    #[test]
    fn diagnostic_codes() {
        let diag = PlatformError::invalid("device", "XC7", "unknown").to_diagnostic();
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.code.to_string(), "E301");
        assert_eq!(diag.origin.as_deref(), Some("device"));
        assert_eq!(
            PlatformError::unsupported("x").to_diagnostic().code.to_string(),
            "E302"
        );
        assert_eq!(
            PlatformError::type_error("a", "b").to_diagnostic().code.to_string(),
            "E303"
        );
        let cfg = PlatformError::from(ConfigError::UnknownResource("led".into()));
        assert_eq!(cfg.to_diagnostic().code.to_string(), "E304");
    }

    #[test]
    fn build_errors_are_configuration_errors() {
        let err = PlatformError::from(BuildError::NotPosedge("fast".into()));
        assert!(matches!(
            err,
            PlatformError::InvalidConfiguration { ref field, ref value, .. }
                if field == "domain" && value == "fast"
        ));
        let err = PlatformError::from(ArchError::UnknownDevice("LFE5U".into()));
        assert!(matches!(err, PlatformError::InvalidConfiguration { .. }));
    }
}
