//! Typed indices into a module's arenas.

use crate::arena::ArenaId;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! netlist_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Wraps a raw index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// The raw index.
            pub fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl ArenaId for $name {
            fn from_raw(index: u32) -> Self {
                Self(index)
            }

            fn as_raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

netlist_id!(
    /// A signal: port, wire or register.
    SignalId,
    "%"
);

netlist_id!(
    /// A primitive or component instance.
    CellId,
    "@"
);

netlist_id!(
    /// A clock domain.
    ClockDomainId,
    "domain#"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_kind_prefix() {
        assert_eq!(SignalId::from_raw(7).to_string(), "%7");
        assert_eq!(CellId::from_raw(0).to_string(), "@0");
        assert_eq!(ClockDomainId::from_raw(2).to_string(), "domain#2");
    }

    #[test]
    fn ids_order_by_allocation() {
        assert!(CellId::from_raw(1) < CellId::from_raw(2));
        assert_eq!(SignalId::from_raw(3).as_raw(), 3);
    }
}
