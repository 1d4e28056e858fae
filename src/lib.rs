pub mod arena;
pub mod config;
pub mod error;
pub mod game;
pub mod plugin;
pub mod strategy;

pub use arena::*;
pub use config::*;
pub use error::*;
pub use game::*;
pub use plugin::*;
pub use strategy::*;
