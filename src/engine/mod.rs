//! Lead scoring and pipeline engine.
//!
//! Everything in here is side-effect free. Persistence and events are handled by the
//! service layer.

pub mod assignment;
pub mod duplicates;
pub mod intake;
pub mod pipeline;
pub mod scoring;
pub mod temperature;

use crate::errors::AppError;
use crate::models::{EngineSettings, LeadProfile, Temperature};

/// Validate every table and threshold in a settings snapshot.
pub fn validate_settings(settings: &EngineSettings) -> Result<(), AppError> {
    scoring::check_tables(&settings.zip_tiers, &settings.source_weights)?;
    temperature::check_thresholds(&settings.thresholds)
}

/// Score a profile and classify the result under one settings snapshot.
pub fn evaluate(
    profile: &LeadProfile,
    settings: &EngineSettings,
) -> Result<(u8, Temperature), AppError> {
    let score = scoring::score(profile, &settings.zip_tiers, &settings.source_weights)?;
    let temperature = temperature::classify(score, &settings.thresholds)?;
    Ok((score, temperature))
}
