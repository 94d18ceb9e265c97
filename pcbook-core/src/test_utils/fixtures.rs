//! Sample data factory
//!
//! Random but plausible laptops for tests and the command-line demo.

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::model::{
    Cpu, Gpu, Keyboard, KeyboardLayout, Laptop, Memory, MemoryUnit, Panel, Resolution, Screen,
    Storage, StorageDriver, Weight,
};

/// Seed used by [`seeded_rng`]
pub const DEFAULT_TEST_SEED: u64 = 42;

/// Deterministic RNG for reproducible fixtures
pub fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(DEFAULT_TEST_SEED)
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, items: &'a [&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

pub fn sample_cpu<R: Rng + ?Sized>(rng: &mut R) -> Cpu {
    let brand = pick(rng, &["Intel", "AMD"]);
    let name = match brand {
        "Intel" => pick(rng, &["Xeon E-2286M", "Core i9-9980HK", "Core i7-9750H", "Core i5-9400F"]),
        _ => pick(rng, &["Ryzen 7 PRO 2700U", "Ryzen 5 PRO 3500U", "Ryzen 3 PRO 3200GE"]),
    };
    let number_cores = rng.random_range(2..=8);
    let min_ghz = rng.random_range(2.0..3.5);

    Cpu {
        brand: brand.to_string(),
        name: name.to_string(),
        number_cores,
        number_threads: rng.random_range(number_cores..=12),
        min_ghz,
        max_ghz: rng.random_range(min_ghz..5.0),
    }
}

pub fn sample_gpu<R: Rng + ?Sized>(rng: &mut R) -> Gpu {
    let brand = pick(rng, &["Nvidia", "AMD"]);
    let name = match brand {
        "Nvidia" => pick(rng, &["RTX 2060", "RTX 2070", "GTX 1660-Ti", "GTX 1070"]),
        _ => pick(rng, &["RX 590", "RX 580", "RX 5700-XT", "RX Vega-56"]),
    };
    let min_ghz = rng.random_range(1.0..1.5);

    Gpu {
        brand: brand.to_string(),
        name: name.to_string(),
        min_ghz,
        max_ghz: rng.random_range(min_ghz..2.0),
        memory: Memory::gigabytes(rng.random_range(2..=6)),
    }
}

pub fn sample_screen<R: Rng + ?Sized>(rng: &mut R) -> Screen {
    let height = rng.random_range(1080..=4320);
    Screen {
        size_inch: rng.random_range(13..=17) as f32,
        resolution: Resolution {
            width: height * 16 / 9,
            height,
        },
        panel: if rng.random_bool(0.5) { Panel::Ips } else { Panel::Oled },
        multitouch: rng.random_bool(0.5),
    }
}

/// Build a random laptop from `rng`, with a fresh UUID id
pub fn sample_laptop_with<R: Rng + ?Sized>(rng: &mut R) -> Laptop {
    let brand = pick(rng, &["Apple", "Dell", "Lenovo"]);
    let name = match brand {
        "Apple" => pick(rng, &["Macbook Air", "Macbook Pro"]),
        "Dell" => pick(rng, &["Latitude", "Vostro", "XPS", "Alienware"]),
        _ => pick(rng, &["Thinkpad X1", "Thinkpad P1", "Thinkpad P53"]),
    };
    let layout = [KeyboardLayout::Qwerty, KeyboardLayout::Qwertz, KeyboardLayout::Azerty]
        .choose(rng)
        .copied()
        .unwrap_or_default();

    Laptop {
        id: Uuid::new_v4().to_string(),
        brand: brand.to_string(),
        name: name.to_string(),
        cpu: sample_cpu(rng),
        ram: Memory::gigabytes(rng.random_range(4..=64)),
        gpus: vec![sample_gpu(rng)],
        storages: vec![
            Storage {
                driver: StorageDriver::Ssd,
                memory: Memory::gigabytes(rng.random_range(128..=1024)),
            },
            Storage {
                driver: StorageDriver::Hdd,
                memory: Memory::new(rng.random_range(1..=6), MemoryUnit::Terabyte),
            },
        ],
        screen: sample_screen(rng),
        keyboard: Keyboard {
            layout,
            backlit: rng.random_bool(0.5),
        },
        weight: Weight::Kg(rng.random_range(1.0..3.0)),
        price_usd: rng.random_range(1500.0..3000.0),
        release_year: rng.random_range(2017..=2019),
        updated_at: Utc::now(),
    }
}

/// A random laptop using the thread-local RNG
pub fn sample_laptop() -> Laptop {
    sample_laptop_with(&mut rand::rng())
}

/// A random score in 1..=10
pub fn sample_score() -> f64 {
    f64::from(rand::rng().random_range(1u8..=10))
}
