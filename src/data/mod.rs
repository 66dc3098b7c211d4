//! Measurement sources.
//!
//! - HTTP measurement API (`api`)
//! - deterministic synthetic rows for offline use (`sample`)
//!
//! Both implement [`MeasurementSource`], the seam the CLI, poller and tests
//! program against.

pub mod api;
pub mod sample;

pub use api::MeasurementsClient;
pub use sample::{SampleGenerator, SampleSource};

use crate::domain::{DashConfig, MeasurementQuery, RawRow, SourceKind};
use crate::error::AppError;

/// Something that can hand back raw measurement rows.
///
/// Implementations do no normalization: they return rows as the server
/// shaped them, or an `AppError` describing why the fetch failed.
pub trait MeasurementSource: Send + Sync {
    /// Rows matching `query`, in server order.
    fn list(&self, query: &MeasurementQuery) -> Result<Vec<RawRow>, AppError>;

    /// The most recent row, if the server has one.
    fn latest(&self, train_id: Option<&str>) -> Result<Option<RawRow>, AppError>;

    /// Short description for status lines.
    fn describe(&self) -> String;
}

/// Build the source selected by the configuration.
pub fn source_from_config(config: &DashConfig) -> Result<Box<dyn MeasurementSource>, AppError> {
    match &config.source {
        SourceKind::Api { base_url } => Ok(Box::new(MeasurementsClient::new(base_url)?)),
        SourceKind::Sample { seed, days } => Ok(Box::new(SampleSource::new(*seed, *days))),
    }
}
