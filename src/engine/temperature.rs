//! Score to temperature band classification.

use crate::errors::AppError;
use crate::models::{Temperature, TemperatureThresholds};

use super::scoring::MAX_SCORE;

/// Thresholds must be ordered `100 >= hot >= warm >= cool`.
pub fn check_thresholds(thresholds: &TemperatureThresholds) -> Result<(), AppError> {
    let TemperatureThresholds { hot, warm, cool } = *thresholds;
    if hot > MAX_SCORE {
        return Err(AppError::Configuration(format!(
            "Hot threshold {} exceeds {}",
            hot, MAX_SCORE
        )));
    }
    if warm > hot || cool > warm {
        return Err(AppError::Configuration(format!(
            "Temperature thresholds must be ordered hot >= warm >= cool (got hot={}, warm={}, cool={})",
            hot, warm, cool
        )));
    }
    Ok(())
}

pub fn classify(score: u8, thresholds: &TemperatureThresholds) -> Result<Temperature, AppError> {
    check_thresholds(thresholds)?;

    let temperature = if score >= thresholds.hot {
        Temperature::Hot
    } else if score >= thresholds.warm {
        Temperature::Warm
    } else if score >= thresholds.cool {
        Temperature::Cool
    } else {
        Temperature::Cold
    };
    Ok(temperature)
}
