//! Catalog domain model
//!
//! Plain owned data. Stores hand out clones of these types, never references
//! into their own state.

mod filter;
mod laptop;
mod memory;
mod rating;
mod user;

pub use filter::Filter;
pub use laptop::{
    Cpu, Gpu, Keyboard, KeyboardLayout, Laptop, Panel, Resolution, Screen, Storage,
    StorageDriver, Weight,
};
pub use memory::{Memory, MemoryUnit};
pub use rating::Rating;
pub use user::{Role, User, UserError};
