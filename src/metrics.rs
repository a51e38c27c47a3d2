//! Error metrics for comparing model output against historical series.
use anyhow::{Result, ensure};

/// Error metrics of a model series relative to a historical reference
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ErrorMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean square error
    pub rmse: f64,
    /// RMSE normalised by the range of the historical series
    pub nrmse: f64,
}

/// Calculate MAE, RMSE and NRMSE for a model series against a historical one.
///
/// # Arguments
///
/// * `historical` - The historical reference values
/// * `model` - The model output values, aligned with `historical`
///
/// # Returns
///
/// The error metrics, or an error if the series are empty, have different
/// lengths, or the historical series spans a zero range (NRMSE undefined).
pub fn calculate_error_metrics(historical: &[f64], model: &[f64]) -> Result<ErrorMetrics> {
    ensure!(
        !historical.is_empty(),
        "Cannot calculate error metrics for empty series"
    );
    ensure!(
        historical.len() == model.len(),
        "Series must have equal lengths ({} vs {})",
        historical.len(),
        model.len()
    );

    let count = historical.len() as f64;
    let mae = historical
        .iter()
        .zip(model)
        .map(|(h, m)| (h - m).abs())
        .sum::<f64>()
        / count;
    let rmse = (historical
        .iter()
        .zip(model)
        .map(|(h, m)| (h - m).powi(2))
        .sum::<f64>()
        / count)
        .sqrt();

    let (min, max) = historical.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &value| {
        (min.min(value), max.max(value))
    });
    let range = max - min;
    ensure!(
        range > 0.0,
        "Historical series must span a non-zero range to normalise the RMSE"
    );

    Ok(ErrorMetrics {
        mae,
        rmse,
        nrmse: rmse / range,
    })
}
