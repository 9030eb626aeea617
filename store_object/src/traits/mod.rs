//! Traits shared by the mappers

pub mod core;

pub use self::core::{Backing, Entity, Table, View};
