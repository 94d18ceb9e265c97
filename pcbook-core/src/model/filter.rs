//! Search filter and the qualification predicate

use serde::{Deserialize, Serialize};

use super::laptop::Laptop;
use super::memory::Memory;

/// Query used by a single search call. Never persisted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Filter {
    pub max_price_usd: f64,
    pub min_cpu_cores: u32,
    pub min_cpu_ghz: f64,
    pub min_ram: Memory,
}

impl Filter {
    /// Returns true if `laptop` satisfies every bound of the filter.
    pub fn is_qualified(&self, laptop: &Laptop) -> bool {
        if laptop.price_usd > self.max_price_usd {
            return false;
        }
        if laptop.cpu.number_cores < self.min_cpu_cores {
            return false;
        }
        if laptop.cpu.min_ghz < self.min_cpu_ghz {
            return false;
        }
        laptop.ram.to_bits() >= self.min_ram.to_bits()
    }
}
