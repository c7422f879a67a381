use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use stockwatch_core::CompanyId;

use crate::alert::AlertsResponse;
use crate::clock::{Clock, SystemClock};
use crate::error::ForecastError;
use crate::job::ForecastJob;
use crate::repository::{load_snapshot, Repository};
use crate::window::WindowDays;

/// Forecaster settings, supplied by the caller (no process-wide state).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct ForecastConfig {
    /// Window used when the request supplies none, or an invalid one.
    pub default_window: WindowDays,
}

/// Stockout forecaster: loads a company snapshot and runs a [`ForecastJob`].
///
/// Either the full alert set is produced or the call fails; there is no
/// partial result.
#[derive(Debug, Clone)]
pub struct Forecaster<R, C = SystemClock> {
    repository: R,
    clock: C,
    config: ForecastConfig,
}

impl<R: Repository> Forecaster<R, SystemClock> {
    pub fn new(repository: R, config: ForecastConfig) -> Self {
        Self::with_clock(repository, SystemClock, config)
    }
}

impl<R: Repository, C: Clock> Forecaster<R, C> {
    pub fn with_clock(repository: R, clock: C, config: ForecastConfig) -> Self {
        Self {
            repository,
            clock,
            config,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    /// Resolve a raw `days` value, recovering invalid input with the default window.
    pub fn window_or_default(&self, raw: Option<&str>) -> WindowDays {
        WindowDays::parse_or(raw, self.config.default_window)
    }

    /// Compute low-stock alerts for `company_id` over `window` ending at `now`.
    pub async fn compute_low_stock_alerts(
        &self,
        company_id: CompanyId,
        window: WindowDays,
        now: DateTime<Utc>,
    ) -> Result<AlertsResponse, ForecastError> {
        let started = Instant::now();

        let snapshot = load_snapshot(&self.repository, company_id, window.start(now)).await?;
        let response = ForecastJob::new(snapshot, window, now).run();

        info!(
            company_id = %company_id,
            window_days = window.get(),
            alerts = response.total_alerts(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "low-stock forecast computed"
        );

        Ok(response)
    }

    /// Request-facing entry point: lenient window parsing and the injected clock.
    pub async fn compute_from_request(
        &self,
        company_id: CompanyId,
        raw_window: Option<&str>,
    ) -> Result<AlertsResponse, ForecastError> {
        let window = self.window_or_default(raw_window);
        self.compute_low_stock_alerts(company_id, window, self.clock.now())
            .await
    }
}
