//! `stockwatch-forecast`
//!
//! **Responsibility:** low-stock forecasting over tenant-scoped snapshots.
//!
//! - Storage agnostic: data arrives through the [`Repository`] trait.
//! - Never mutates domain state and never writes back.
//! - Emits an ordered [`AlertsResponse`], not domain events.

pub mod alert;
pub mod bundle;
pub mod clock;
pub mod error;
pub mod forecaster;
pub mod job;
pub mod repository;
pub mod simple;
pub mod snapshot;
pub mod supplier;
pub mod velocity;
pub mod window;

pub use alert::{Alert, AlertsResponse};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ForecastError, RepositoryError};
pub use forecaster::{ForecastConfig, Forecaster};
pub use job::ForecastJob;
pub use repository::{load_snapshot, Repository};
pub use snapshot::ForecastSnapshot;
pub use supplier::{SupplierInfo, SupplierResolver};
pub use velocity::SalesVelocity;
pub use window::{InvalidWindow, WindowDays, DEFAULT_WINDOW_DAYS};
