//! Catalog record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::memory::Memory;

/// A laptop in the catalog.
///
/// Every nested type is owned, so `clone()` is a full deep copy and never
/// shares state with the original.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Laptop {
    pub id: String,
    pub brand: String,
    pub name: String,
    pub cpu: Cpu,
    pub ram: Memory,
    pub gpus: Vec<Gpu>,
    pub storages: Vec<Storage>,
    pub screen: Screen,
    pub keyboard: Keyboard,
    pub weight: Weight,
    pub price_usd: f64,
    pub release_year: u32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cpu {
    pub brand: String,
    pub name: String,
    pub number_cores: u32,
    pub number_threads: u32,
    pub min_ghz: f64,
    pub max_ghz: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Gpu {
    pub brand: String,
    pub name: String,
    pub min_ghz: f64,
    pub max_ghz: f64,
    pub memory: Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageDriver {
    #[default]
    Unknown,
    Hdd,
    Ssd,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Storage {
    pub driver: StorageDriver,
    pub memory: Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Unknown,
    Ips,
    Oled,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Screen {
    pub size_inch: f32,
    pub resolution: Resolution,
    pub panel: Panel,
    pub multitouch: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyboardLayout {
    #[default]
    Unknown,
    Qwerty,
    Qwertz,
    Azerty,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Keyboard {
    pub layout: KeyboardLayout,
    pub backlit: bool,
}

/// Laptop weight in either kilograms or pounds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weight {
    Kg(f64),
    Lb(f64),
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Kg(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::MemoryUnit;

    #[test]
    fn test_clone_is_independent() {
        let mut original = Laptop {
            id: "a".to_string(),
            gpus: vec![Gpu {
                name: "RTX".to_string(),
                memory: Memory::new(4, MemoryUnit::Gigabyte),
                ..Default::default()
            }],
            ..Default::default()
        };

        let copy = original.clone();
        original.gpus[0].name.push_str(" 3070");
        original.cpu.number_cores = 16;

        assert_eq!(copy.gpus[0].name, "RTX");
        assert_eq!(copy.cpu.number_cores, 0);
    }

    #[test]
    fn test_json_round_trip_keeps_weight_variant() {
        let laptop = Laptop {
            weight: Weight::Lb(4.2),
            ..Default::default()
        };
        let json = serde_json::to_string(&laptop).unwrap();
        assert!(json.contains("\"lb\":4.2"));
        let back: Laptop = serde_json::from_str(&json).unwrap();
        assert_eq!(back, laptop);
    }
}
