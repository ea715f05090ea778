//! iCE40 platform lowering: power-on reset and I/O buffers.
//!
//! Two passes share one [`FamilyProfile`](icepick_arch::FamilyProfile):
//!
//! - [`por::PowerOnReset`] builds the primary clock domain from the default
//!   clock source, holding its reset until a stabilization window has
//!   elapsed. iCE40 block RAMs read as zero for a few microseconds after
//!   configuration, so every design needs this window.
//! - [`io::IoLowering`] turns a [`BufferDescriptor`] and a [`PortBinding`]
//!   into `SB_IO`/`SB_GB_IO` cells, with `SB_LUT4` inverters and `SB_DFF`
//!   re-registration where the mode calls for them.
//!
//! [`Platform`] binds both to an `icepick.toml` description.

#![warn(missing_docs)]

pub mod buffer;
pub mod codes;
pub mod error;
pub mod io;
pub mod platform;
pub mod por;

pub use buffer::{
    BufferDescriptor, DifferentialBinding, Direction, InputSide, OutputSide, PinBinding,
    PortBinding, PortTopology, RegistrationMode, SingleEndedBinding, GLOBAL_ATTR,
};
pub use error::PlatformError;
pub use io::{pin_type, IoLowering, LoweredBuffer};
pub use platform::{Platform, RequestedPort, PRIMARY_DOMAIN};
pub use por::{
    DefaultClock, PorDomain, PorInputs, PorPlan, PorSource, PowerOnReset, ResetTimer,
    ResetTimerState, POR_DOMAIN,
};
