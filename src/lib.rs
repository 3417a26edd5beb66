pub mod args;
pub mod commands;
mod config;
mod delivery;
mod error;
mod export;
pub mod model;
mod repository;
mod store;
mod utils;

pub use config::Config;
pub use delivery::Mode;
pub use error::Error;
pub use error::Result;
