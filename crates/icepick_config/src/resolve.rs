//! Resource resolution: turning a named resource into bindable pins.

use crate::error::ConfigError;
use crate::types::PlatformConfig;
use icepick_common::Frequency;
use std::collections::BTreeMap;

/// The physical pins of a resolved resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedPins {
    /// One pin per bit.
    SingleEnded(Vec<String>),
    /// One positive and one negative pin per bit.
    Differential {
        /// Positive legs.
        p: Vec<String>,
        /// Negative legs.
        n: Vec<String>,
    },
}

impl ResolvedPins {
    /// Number of logical bits.
    pub fn width(&self) -> usize {
        match self {
            ResolvedPins::SingleEnded(pins) => pins.len(),
            ResolvedPins::Differential { p, .. } => p.len(),
        }
    }
}

/// A resource with its frequency parsed and pins classified.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    /// The resource name.
    pub name: String,
    /// The resource's pins.
    pub pins: ResolvedPins,
    /// Attributes applied to every pin.
    pub attrs: BTreeMap<String, toml::Value>,
    /// Whether every bit is active-low.
    pub invert: bool,
    /// The nominal frequency, for clock resources.
    pub frequency: Option<Frequency>,
}

/// Resolves a named resource from a validated configuration.
pub fn resolve_resource(
    config: &PlatformConfig,
    name: &str,
) -> Result<ResolvedResource, ConfigError> {
    let def = config
        .resources
        .get(name)
        .ok_or_else(|| ConfigError::UnknownResource(name.to_string()))?;

    let pins = match &def.diff {
        Some(diff) => ResolvedPins::Differential {
            p: diff.p.clone(),
            n: diff.n.clone(),
        },
        None => ResolvedPins::SingleEnded(def.pins.clone()),
    };

    let frequency = def
        .frequency
        .as_deref()
        .map(str::parse::<Frequency>)
        .transpose()
        .map_err(|e| ConfigError::ValidationError(format!("resource '{name}': {e}")))?;

    Ok(ResolvedResource {
        name: name.to_string(),
        pins,
        attrs: def.attrs.clone(),
        invert: def.invert,
        frequency,
    })
}
