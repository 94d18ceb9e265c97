//! Wire messages for the `techschool.pcbook` package
//!
//! Plain prost structs (standard protobuf encoding, no `.proto` file) plus the
//! tonic service code generated from them by `build.rs`, and conversions to and
//! from the `pcbook_core::model` types.

use chrono::{DateTime, Utc};
use pcbook_core::model;

/// Full gRPC method paths, the keys of the authorization tables
pub mod methods {
    pub const CREATE_LAPTOP: &str = "/techschool.pcbook.LaptopService/CreateLaptop";
    pub const SEARCH_LAPTOP: &str = "/techschool.pcbook.LaptopService/SearchLaptop";
    pub const UPLOAD_IMAGE: &str = "/techschool.pcbook.LaptopService/UploadImage";
    pub const RATE_LAPTOP: &str = "/techschool.pcbook.LaptopService/RateLaptop";
    pub const LOGIN: &str = "/techschool.pcbook.AuthService/Login";
}

// ---------------------------------------------------------------------------
// Laptop and its parts
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct Memory {
    #[prost(uint64, tag = "1")]
    pub value: u64,
    #[prost(enumeration = "memory::Unit", tag = "2")]
    pub unit: i32,
}

pub mod memory {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Unit {
        Unknown = 0,
        Bit = 1,
        Byte = 2,
        Kilobyte = 3,
        Megabyte = 4,
        Gigabyte = 5,
        Terabyte = 6,
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Cpu {
    #[prost(string, tag = "1")]
    pub brand: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(uint32, tag = "3")]
    pub number_cores: u32,
    #[prost(uint32, tag = "4")]
    pub number_threads: u32,
    #[prost(double, tag = "5")]
    pub min_ghz: f64,
    #[prost(double, tag = "6")]
    pub max_ghz: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Gpu {
    #[prost(string, tag = "1")]
    pub brand: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(double, tag = "3")]
    pub min_ghz: f64,
    #[prost(double, tag = "4")]
    pub max_ghz: f64,
    #[prost(message, optional, tag = "5")]
    pub memory: Option<Memory>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Storage {
    #[prost(enumeration = "storage::Driver", tag = "1")]
    pub driver: i32,
    #[prost(message, optional, tag = "2")]
    pub memory: Option<Memory>,
}

pub mod storage {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Driver {
        Unknown = 0,
        Hdd = 1,
        Ssd = 2,
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Resolution {
    #[prost(uint32, tag = "1")]
    pub width: u32,
    #[prost(uint32, tag = "2")]
    pub height: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Screen {
    #[prost(float, tag = "1")]
    pub size_inch: f32,
    #[prost(message, optional, tag = "2")]
    pub resolution: Option<Resolution>,
    #[prost(enumeration = "screen::Panel", tag = "3")]
    pub panel: i32,
    #[prost(bool, tag = "4")]
    pub multitouch: bool,
}

pub mod screen {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Panel {
        Unknown = 0,
        Ips = 1,
        Oled = 2,
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Keyboard {
    #[prost(enumeration = "keyboard::Layout", tag = "1")]
    pub layout: i32,
    #[prost(bool, tag = "2")]
    pub backlit: bool,
}

pub mod keyboard {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
    #[repr(i32)]
    pub enum Layout {
        Unknown = 0,
        Qwerty = 1,
        Qwertz = 2,
        Azerty = 3,
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Laptop {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub brand: String,
    #[prost(string, tag = "3")]
    pub name: String,
    #[prost(message, optional, tag = "4")]
    pub cpu: Option<Cpu>,
    #[prost(message, optional, tag = "5")]
    pub ram: Option<Memory>,
    #[prost(message, repeated, tag = "6")]
    pub gpus: Vec<Gpu>,
    #[prost(message, repeated, tag = "7")]
    pub storages: Vec<Storage>,
    #[prost(message, optional, tag = "8")]
    pub screen: Option<Screen>,
    #[prost(message, optional, tag = "9")]
    pub keyboard: Option<Keyboard>,
    #[prost(oneof = "laptop::Weight", tags = "10, 11")]
    pub weight: Option<laptop::Weight>,
    #[prost(double, tag = "12")]
    pub price_usd: f64,
    #[prost(uint32, tag = "13")]
    pub release_year: u32,
    #[prost(message, optional, tag = "14")]
    pub updated_at: Option<prost_types::Timestamp>,
}

pub mod laptop {
    #[derive(Clone, Copy, PartialEq, prost::Oneof)]
    pub enum Weight {
        #[prost(double, tag = "10")]
        WeightKg(f64),
        #[prost(double, tag = "11")]
        WeightLb(f64),
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Filter {
    #[prost(double, tag = "1")]
    pub max_price_usd: f64,
    #[prost(uint32, tag = "2")]
    pub min_cpu_cores: u32,
    #[prost(double, tag = "3")]
    pub min_cpu_ghz: f64,
    #[prost(message, optional, tag = "4")]
    pub min_ram: Option<Memory>,
}

// ---------------------------------------------------------------------------
// LaptopService requests and responses
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateLaptopRequest {
    #[prost(message, optional, tag = "1")]
    pub laptop: Option<Laptop>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CreateLaptopResponse {
    #[prost(string, tag = "1")]
    pub id: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchLaptopRequest {
    #[prost(message, optional, tag = "1")]
    pub filter: Option<Filter>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct SearchLaptopResponse {
    #[prost(message, optional, tag = "1")]
    pub laptop: Option<Laptop>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ImageInfo {
    #[prost(string, tag = "1")]
    pub laptop_id: String,
    #[prost(string, tag = "2")]
    pub image_type: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UploadImageRequest {
    #[prost(oneof = "upload_image_request::Data", tags = "1, 2")]
    pub data: Option<upload_image_request::Data>,
}

pub mod upload_image_request {
    #[derive(Clone, PartialEq, prost::Oneof)]
    pub enum Data {
        #[prost(message, tag = "1")]
        Info(super::ImageInfo),
        #[prost(bytes, tag = "2")]
        ChunkData(Vec<u8>),
    }
}

impl UploadImageRequest {
    pub fn info(laptop_id: impl Into<String>, image_type: impl Into<String>) -> Self {
        Self {
            data: Some(upload_image_request::Data::Info(ImageInfo {
                laptop_id: laptop_id.into(),
                image_type: image_type.into(),
            })),
        }
    }

    pub fn chunk(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: Some(upload_image_request::Data::ChunkData(data.into())),
        }
    }
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UploadImageResponse {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(uint32, tag = "2")]
    pub size: u32,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RateLaptopRequest {
    #[prost(string, tag = "1")]
    pub laptop_id: String,
    #[prost(double, tag = "2")]
    pub score: f64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct RateLaptopResponse {
    #[prost(string, tag = "1")]
    pub laptop_id: String,
    #[prost(uint32, tag = "2")]
    pub rated_count: u32,
    #[prost(double, tag = "3")]
    pub average_score: f64,
}

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

#[derive(Clone, PartialEq, prost::Message)]
pub struct LoginRequest {
    #[prost(string, tag = "1")]
    pub username: String,
    #[prost(string, tag = "2")]
    pub password: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LoginResponse {
    #[prost(string, tag = "1")]
    pub access_token: String,
}

// ---------------------------------------------------------------------------
// Generated service traits + server/client
// ---------------------------------------------------------------------------

include!(concat!(env!("OUT_DIR"), "/techschool.pcbook.LaptopService.rs"));
include!(concat!(env!("OUT_DIR"), "/techschool.pcbook.AuthService.rs"));

// ---------------------------------------------------------------------------
// Conversions to and from the domain model
// ---------------------------------------------------------------------------

impl From<model::MemoryUnit> for memory::Unit {
    fn from(unit: model::MemoryUnit) -> Self {
        match unit {
            model::MemoryUnit::Unknown => memory::Unit::Unknown,
            model::MemoryUnit::Bit => memory::Unit::Bit,
            model::MemoryUnit::Byte => memory::Unit::Byte,
            model::MemoryUnit::Kilobyte => memory::Unit::Kilobyte,
            model::MemoryUnit::Megabyte => memory::Unit::Megabyte,
            model::MemoryUnit::Gigabyte => memory::Unit::Gigabyte,
            model::MemoryUnit::Terabyte => memory::Unit::Terabyte,
        }
    }
}

impl From<memory::Unit> for model::MemoryUnit {
    fn from(unit: memory::Unit) -> Self {
        match unit {
            memory::Unit::Unknown => model::MemoryUnit::Unknown,
            memory::Unit::Bit => model::MemoryUnit::Bit,
            memory::Unit::Byte => model::MemoryUnit::Byte,
            memory::Unit::Kilobyte => model::MemoryUnit::Kilobyte,
            memory::Unit::Megabyte => model::MemoryUnit::Megabyte,
            memory::Unit::Gigabyte => model::MemoryUnit::Gigabyte,
            memory::Unit::Terabyte => model::MemoryUnit::Terabyte,
        }
    }
}

impl From<model::Memory> for Memory {
    fn from(m: model::Memory) -> Self {
        Self {
            value: m.value,
            unit: memory::Unit::from(m.unit) as i32,
        }
    }
}

impl From<Memory> for model::Memory {
    fn from(m: Memory) -> Self {
        // Unrecognized enum values decode as Unknown, which normalizes to zero bits.
        model::Memory::new(m.value, m.unit().into())
    }
}

fn memory_or_default(m: Option<Memory>) -> model::Memory {
    m.map(Into::into).unwrap_or_default()
}

impl From<model::Cpu> for Cpu {
    fn from(c: model::Cpu) -> Self {
        Self {
            brand: c.brand,
            name: c.name,
            number_cores: c.number_cores,
            number_threads: c.number_threads,
            min_ghz: c.min_ghz,
            max_ghz: c.max_ghz,
        }
    }
}

impl From<Cpu> for model::Cpu {
    fn from(c: Cpu) -> Self {
        Self {
            brand: c.brand,
            name: c.name,
            number_cores: c.number_cores,
            number_threads: c.number_threads,
            min_ghz: c.min_ghz,
            max_ghz: c.max_ghz,
        }
    }
}

impl From<model::Gpu> for Gpu {
    fn from(g: model::Gpu) -> Self {
        Self {
            brand: g.brand,
            name: g.name,
            min_ghz: g.min_ghz,
            max_ghz: g.max_ghz,
            memory: Some(g.memory.into()),
        }
    }
}

impl From<Gpu> for model::Gpu {
    fn from(g: Gpu) -> Self {
        Self {
            brand: g.brand,
            name: g.name,
            min_ghz: g.min_ghz,
            max_ghz: g.max_ghz,
            memory: memory_or_default(g.memory),
        }
    }
}

impl From<model::Storage> for Storage {
    fn from(s: model::Storage) -> Self {
        let driver = match s.driver {
            model::StorageDriver::Unknown => storage::Driver::Unknown,
            model::StorageDriver::Hdd => storage::Driver::Hdd,
            model::StorageDriver::Ssd => storage::Driver::Ssd,
        };
        Self {
            driver: driver as i32,
            memory: Some(s.memory.into()),
        }
    }
}

impl From<Storage> for model::Storage {
    fn from(s: Storage) -> Self {
        let driver = match s.driver() {
            storage::Driver::Unknown => model::StorageDriver::Unknown,
            storage::Driver::Hdd => model::StorageDriver::Hdd,
            storage::Driver::Ssd => model::StorageDriver::Ssd,
        };
        Self {
            driver,
            memory: memory_or_default(s.memory),
        }
    }
}

impl From<model::Screen> for Screen {
    fn from(s: model::Screen) -> Self {
        let panel = match s.panel {
            model::Panel::Unknown => screen::Panel::Unknown,
            model::Panel::Ips => screen::Panel::Ips,
            model::Panel::Oled => screen::Panel::Oled,
        };
        Self {
            size_inch: s.size_inch,
            resolution: Some(Resolution {
                width: s.resolution.width,
                height: s.resolution.height,
            }),
            panel: panel as i32,
            multitouch: s.multitouch,
        }
    }
}

impl From<Screen> for model::Screen {
    fn from(s: Screen) -> Self {
        let panel = match s.panel() {
            screen::Panel::Unknown => model::Panel::Unknown,
            screen::Panel::Ips => model::Panel::Ips,
            screen::Panel::Oled => model::Panel::Oled,
        };
        let resolution = s.resolution.unwrap_or_default();
        Self {
            size_inch: s.size_inch,
            resolution: model::Resolution {
                width: resolution.width,
                height: resolution.height,
            },
            panel,
            multitouch: s.multitouch,
        }
    }
}

impl From<model::Keyboard> for Keyboard {
    fn from(k: model::Keyboard) -> Self {
        let layout = match k.layout {
            model::KeyboardLayout::Unknown => keyboard::Layout::Unknown,
            model::KeyboardLayout::Qwerty => keyboard::Layout::Qwerty,
            model::KeyboardLayout::Qwertz => keyboard::Layout::Qwertz,
            model::KeyboardLayout::Azerty => keyboard::Layout::Azerty,
        };
        Self {
            layout: layout as i32,
            backlit: k.backlit,
        }
    }
}

impl From<Keyboard> for model::Keyboard {
    fn from(k: Keyboard) -> Self {
        let layout = match k.layout() {
            keyboard::Layout::Unknown => model::KeyboardLayout::Unknown,
            keyboard::Layout::Qwerty => model::KeyboardLayout::Qwerty,
            keyboard::Layout::Qwertz => model::KeyboardLayout::Qwertz,
            keyboard::Layout::Azerty => model::KeyboardLayout::Azerty,
        };
        Self {
            layout,
            backlit: k.backlit,
        }
    }
}

fn to_timestamp(at: DateTime<Utc>) -> prost_types::Timestamp {
    prost_types::Timestamp {
        seconds: at.timestamp(),
        nanos: at.timestamp_subsec_nanos() as i32,
    }
}

fn from_timestamp(ts: prost_types::Timestamp) -> DateTime<Utc> {
    DateTime::from_timestamp(ts.seconds, ts.nanos.max(0) as u32).unwrap_or_default()
}

impl From<model::Laptop> for Laptop {
    fn from(l: model::Laptop) -> Self {
        let weight = match l.weight {
            model::Weight::Kg(kg) => laptop::Weight::WeightKg(kg),
            model::Weight::Lb(lb) => laptop::Weight::WeightLb(lb),
        };
        Self {
            id: l.id,
            brand: l.brand,
            name: l.name,
            cpu: Some(l.cpu.into()),
            ram: Some(l.ram.into()),
            gpus: l.gpus.into_iter().map(Into::into).collect(),
            storages: l.storages.into_iter().map(Into::into).collect(),
            screen: Some(l.screen.into()),
            keyboard: Some(l.keyboard.into()),
            weight: Some(weight),
            price_usd: l.price_usd,
            release_year: l.release_year,
            updated_at: Some(to_timestamp(l.updated_at)),
        }
    }
}

impl From<Laptop> for model::Laptop {
    fn from(l: Laptop) -> Self {
        let weight = match l.weight {
            Some(laptop::Weight::WeightKg(kg)) => model::Weight::Kg(kg),
            Some(laptop::Weight::WeightLb(lb)) => model::Weight::Lb(lb),
            None => model::Weight::default(),
        };
        Self {
            id: l.id,
            brand: l.brand,
            name: l.name,
            cpu: l.cpu.map(Into::into).unwrap_or_default(),
            ram: memory_or_default(l.ram),
            gpus: l.gpus.into_iter().map(Into::into).collect(),
            storages: l.storages.into_iter().map(Into::into).collect(),
            screen: l.screen.map(Into::into).unwrap_or_default(),
            keyboard: l.keyboard.map(Into::into).unwrap_or_default(),
            weight,
            price_usd: l.price_usd,
            release_year: l.release_year,
            updated_at: l.updated_at.map(from_timestamp).unwrap_or_default(),
        }
    }
}

impl From<model::Filter> for Filter {
    fn from(f: model::Filter) -> Self {
        Self {
            max_price_usd: f.max_price_usd,
            min_cpu_cores: f.min_cpu_cores,
            min_cpu_ghz: f.min_cpu_ghz,
            min_ram: Some(f.min_ram.into()),
        }
    }
}

impl From<Filter> for model::Filter {
    fn from(f: Filter) -> Self {
        Self {
            max_price_usd: f.max_price_usd,
            min_cpu_cores: f.min_cpu_cores,
            min_cpu_ghz: f.min_cpu_ghz,
            min_ram: memory_or_default(f.min_ram),
        }
    }
}
