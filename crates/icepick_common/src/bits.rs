//! Two-state bit vectors for constant parameters, masks, and truth tables.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of bits packed per storage word.
const BITS_PER_WORD: u32 = 64;

/// A fixed-width vector of two-state bits, least significant bit at index 0.
///
/// Vendor primitives take their configuration as sized constants (`PIN_TYPE`
/// is six bits wide, `LUT_INIT` sixteen), so the width is part of the value
/// and two vectors with the same numeric value but different widths are not
/// equal.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bits {
    width: u32,
    words: Vec<u64>,
}

impl Bits {
    /// Creates an all-zero vector of the given width.
    pub fn zero(width: u32) -> Self {
        Self {
            width,
            words: vec![0; word_count(width)],
        }
    }

    /// Creates an all-one vector of the given width.
    pub fn ones(width: u32) -> Self {
        let mut bits = Self::zero(width);
        for index in 0..width {
            bits.set(index, true);
        }
        bits
    }

    /// Creates a vector holding the low `width` bits of `value`.
    pub fn from_u64(value: u64, width: u32) -> Self {
        let mut bits = Self::zero(width);
        for index in 0..width.min(BITS_PER_WORD) {
            bits.set(index, (value >> index) & 1 != 0);
        }
        bits
    }

    /// Creates a vector from a slice of flags, `flags[0]` becoming bit 0.
    pub fn from_bools(flags: &[bool]) -> Self {
        let mut bits = Self::zero(flags.len() as u32);
        for (index, &flag) in flags.iter().enumerate() {
            bits.set(index as u32, flag);
        }
        bits
    }

    /// Returns the width in bits.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn get(&self, index: u32) -> bool {
        assert!(
            index < self.width,
            "bit {index} out of range for width {}",
            self.width
        );
        let word = self.words[(index / BITS_PER_WORD) as usize];
        (word >> (index % BITS_PER_WORD)) & 1 != 0
    }

    /// Sets the bit at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.width()`.
    pub fn set(&mut self, index: u32, value: bool) {
        assert!(
            index < self.width,
            "bit {index} out of range for width {}",
            self.width
        );
        let word = &mut self.words[(index / BITS_PER_WORD) as usize];
        let mask = 1u64 << (index % BITS_PER_WORD);
        if value {
            *word |= mask;
        } else {
            *word &= !mask;
        }
    }

    /// Returns the value as a `u64`, or `None` if wider than 64 bits.
    pub fn to_u64(&self) -> Option<u64> {
        match self.width {
            0 => Some(0),
            1..=BITS_PER_WORD => Some(self.words[0]),
            _ => None,
        }
    }

    /// Returns `true` if no bit is set.
    pub fn is_zero(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Returns `true` if every bit is set.
    pub fn is_ones(&self) -> bool {
        self.count_ones() == self.width
    }

    /// Returns the number of set bits.
    pub fn count_ones(&self) -> u32 {
        self.words.iter().map(|w| w.count_ones()).sum()
    }

    /// Formats the value as a `0b`-prefixed binary literal of exactly
    /// `width` digits, e.g. `"0b01"` for a two-bit one.
    pub fn to_binary_literal(&self) -> String {
        format!("0b{self}")
    }
}

impl fmt::Display for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for index in (0..self.width).rev() {
            f.write_str(if self.get(index) { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for Bits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bits({}'b{self})", self.width)
    }
}

fn word_count(width: u32) -> usize {
    width.div_ceil(BITS_PER_WORD) as usize
}
