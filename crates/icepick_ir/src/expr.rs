//! Combinational expressions over signals.

use crate::arena::Arena;
use crate::ids::SignalId;
use crate::signal::{Signal, SignalRef};
use icepick_common::Bits;
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, BitXor, Not};

/// Unary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Bitwise complement.
    Not,
}

/// Binary operators.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Bitwise AND.
    And,
    /// Bitwise OR.
    Or,
    /// Bitwise XOR.
    Xor,
    /// Wrapping addition at the wider operand's width.
    Add,
    /// Equality, one bit wide.
    Eq,
}

/// A combinational expression.
///
/// Built with the `!`, `&`, `|`, `^` operators and the named constructors
/// below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A signal, bit, or constant.
    Ref(SignalRef),
    /// A unary operation.
    Unary {
        /// The operator.
        op: UnaryOp,
        /// The operand.
        operand: Box<Expr>,
    },
    /// A binary operation.
    Binary {
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `cond ? if_true : if_false`.
    Mux {
        /// One-bit select; any non-zero value selects `if_true`.
        cond: Box<Expr>,
        /// Value when `cond` is set.
        if_true: Box<Expr>,
        /// Value when `cond` is clear.
        if_false: Box<Expr>,
    },
}

impl Expr {
    /// The whole signal.
    pub fn signal(id: SignalId) -> Self {
        Expr::Ref(SignalRef::Signal(id))
    }

    /// A constant.
    pub fn constant(bits: Bits) -> Self {
        Expr::Ref(SignalRef::Const(bits))
    }

    /// `lhs + rhs`.
    pub fn sum(lhs: Expr, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Add, lhs, rhs)
    }

    /// `lhs == rhs`.
    pub fn equals(lhs: Expr, rhs: Expr) -> Self {
        Expr::binary(BinaryOp::Eq, lhs, rhs)
    }

    /// `cond ? if_true : if_false`.
    pub fn mux(cond: Expr, if_true: Expr, if_false: Expr) -> Self {
        Expr::Mux {
            cond: Box::new(cond),
            if_true: Box::new(if_true),
            if_false: Box::new(if_false),
        }
    }

    /// A binary operation.
    pub fn binary(op: BinaryOp, lhs: Expr, rhs: Expr) -> Self {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    /// Width of the expression's value in bits.
    pub fn width(&self, signals: &Arena<SignalId, Signal>) -> u32 {
        match self {
            Expr::Ref(SignalRef::Signal(id)) => signals[*id].width,
            Expr::Ref(SignalRef::Bit { .. }) => 1,
            Expr::Ref(SignalRef::Const(bits)) => bits.width(),
            Expr::Unary { operand, .. } => operand.width(signals),
            Expr::Binary {
                op: BinaryOp::Eq, ..
            } => 1,
            Expr::Binary { lhs, rhs, .. } => lhs.width(signals).max(rhs.width(signals)),
            Expr::Mux {
                if_true, if_false, ..
            } => if_true.width(signals).max(if_false.width(signals)),
        }
    }
}

impl From<SignalRef> for Expr {
    fn from(r: SignalRef) -> Self {
        Expr::Ref(r)
    }
}

impl From<SignalId> for Expr {
    fn from(id: SignalId) -> Self {
        Expr::signal(id)
    }
}

impl Not for Expr {
    type Output = Expr;

    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOp::Not,
            operand: Box::new(self),
        }
    }
}

impl BitAnd for Expr {
    type Output = Expr;

    fn bitand(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::And, self, rhs)
    }
}

impl BitOr for Expr {
    type Output = Expr;

    fn bitor(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Or, self, rhs)
    }
}

impl BitXor for Expr {
    type Output = Expr;

    fn bitxor(self, rhs: Expr) -> Expr {
        Expr::binary(BinaryOp::Xor, self, rhs)
    }
}
