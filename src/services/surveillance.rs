//! Weekly disease-surveillance records for a municipality.

use anyhow::Result;

use crate::analyzers::types::WeekRecord;
use crate::analyzers::window::EpiWindow;

#[async_trait::async_trait]
pub trait SurveillanceApi: Send + Sync {
    /// Returns the raw weekly records for `geocode` inside `window`, in the
    /// order the service sent them.
    async fn fetch(&self, geocode: &str, window: &EpiWindow) -> Result<Vec<WeekRecord>>;
}
