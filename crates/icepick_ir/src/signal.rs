//! Signals and references to whole signals, single bits, or constants.

use crate::ids::{ClockDomainId, SignalId};
use icepick_common::{Bits, Ident};
use serde::{Deserialize, Serialize};

/// How a signal is driven.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SignalKind {
    /// Driven by a combinational assignment or a cell output.
    Wire,
    /// Updated on the clock edge of its domain.
    Reg,
    /// A top-level port.
    Port,
}

/// A named, fixed-width signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Signal {
    /// The signal's ID.
    pub id: SignalId,
    /// The signal name.
    pub name: Ident,
    /// Width in bits.
    pub width: u32,
    /// How the signal is driven.
    pub kind: SignalKind,
    /// The clock domain of a register.
    pub domain: Option<ClockDomainId>,
}

/// A reference to a signal, one bit of a signal, or a constant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalRef {
    /// The whole signal.
    Signal(SignalId),
    /// A single bit.
    Bit {
        /// The signal.
        signal: SignalId,
        /// Bit index, 0 is the LSB.
        index: u32,
    },
    /// A constant value.
    Const(Bits),
}

impl SignalRef {
    /// A one-bit constant.
    pub fn bit_const(value: bool) -> Self {
        SignalRef::Const(Bits::from_bools(&[value]))
    }

    /// Selects bit `index` of this reference.
    ///
    /// Selecting bit 0 of a single-bit reference returns the reference
    /// unchanged, so a one-bit signal can be indexed without special cases.
    pub fn bit(&self, index: u32) -> SignalRef {
        match self {
            SignalRef::Signal(id) => SignalRef::Bit {
                signal: *id,
                index,
            },
            SignalRef::Bit { .. } => {
                debug_assert_eq!(index, 0, "cannot index past a single bit");
                self.clone()
            }
            SignalRef::Const(bits) => SignalRef::bit_const(bits.get(index)),
        }
    }

    /// Returns the referenced signal, if any.
    pub fn signal_id(&self) -> Option<SignalId> {
        match self {
            SignalRef::Signal(id) | SignalRef::Bit { signal: id, .. } => Some(*id),
            SignalRef::Const(_) => None,
        }
    }
}

impl From<SignalId> for SignalRef {
    fn from(id: SignalId) -> Self {
        SignalRef::Signal(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_of_signal() {
        let s = SignalId::from_raw(4);
        assert_eq!(
            SignalRef::from(s).bit(2),
            SignalRef::Bit {
                signal: s,
                index: 2
            }
        );
    }

    #[test]
    fn bit_of_const() {
        let c = SignalRef::Const(Bits::from_u64(0b10, 2));
        assert_eq!(c.bit(1), SignalRef::bit_const(true));
        assert_eq!(c.bit(0), SignalRef::bit_const(false));
        assert_eq!(c.signal_id(), None);
    }

    #[test]
    fn bit_of_bit_is_identity() {
        let b = SignalRef::Bit {
            signal: SignalId::from_raw(1),
            index: 5,
        };
        assert_eq!(b.bit(0), b);
    }
}
