//! Memory sizes and unit normalization

use serde::{Deserialize, Serialize};

/// Unit attached to a [`Memory`] value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryUnit {
    #[default]
    Unknown,
    Bit,
    Byte,
    Kilobyte,
    Megabyte,
    Gigabyte,
    Terabyte,
}

impl MemoryUnit {
    /// Left shift that converts one unit of `self` into bits.
    ///
    /// Decimal prefixes are treated as binary multiples. `None` for
    /// [`MemoryUnit::Unknown`].
    fn bit_shift(self) -> Option<u32> {
        match self {
            MemoryUnit::Unknown => None,
            MemoryUnit::Bit => Some(0),
            MemoryUnit::Byte => Some(3),
            MemoryUnit::Kilobyte => Some(13),
            MemoryUnit::Megabyte => Some(23),
            MemoryUnit::Gigabyte => Some(33),
            MemoryUnit::Terabyte => Some(43),
        }
    }
}

/// An amount of memory, e.g. `16 GIGABYTE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Memory {
    pub value: u64,
    pub unit: MemoryUnit,
}

impl Memory {
    pub fn new(value: u64, unit: MemoryUnit) -> Self {
        Self { value, unit }
    }

    pub fn gigabytes(value: u64) -> Self {
        Self::new(value, MemoryUnit::Gigabyte)
    }

    /// Normalize to a bit count. Unknown units normalize to zero.
    ///
    /// Values too large for the shift wrap the same way a plain `<<` on a
    /// `u64` would.
    pub fn to_bits(&self) -> u64 {
        match self.unit.bit_shift() {
            Some(shift) => self.value.wrapping_shl(shift),
            None => 0,
        }
    }
}
