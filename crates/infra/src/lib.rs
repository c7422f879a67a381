//! Infrastructure layer: storage adapters, product registry, config, demo data.

pub mod config;
pub mod read_model;
pub mod registry;
pub mod seed;


pub use config::{AppConfig, ConfigError};
pub use read_model::InMemoryRepository;
pub use registry::{ProductRegistry, RegistrationError};

#[cfg(feature = "postgres")]
pub use read_model::PgRepository;
