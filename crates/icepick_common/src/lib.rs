//! Shared foundational types used across the icepick iCE40 lowering toolchain.
//!
//! This crate provides interned identifiers, frequency values with cycle
//! arithmetic, two-state bit vectors for primitive parameters, and content
//! hashing for reproducible netlist fingerprints.

#![warn(missing_docs)]

pub mod bits;
pub mod frequency;
pub mod hash;
pub mod ident;

pub use bits::Bits;
pub use frequency::{Frequency, ParseFrequencyError};
pub use hash::ContentHash;
pub use ident::{Ident, Interner};
