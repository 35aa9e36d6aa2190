//! Linear trend projection of a daily session series.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::engine::SeriesPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Historical,
    Forecast,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub sessions: i64,
    pub kind: PointKind,
}

pub type ForecastSeries = Vec<ForecastPoint>;

/// Least-squares line `sessions ≈ slope * offset + intercept`, where `offset`
/// is the number of days since `origin`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendLine {
    pub origin: NaiveDate,
    pub slope: f64,
    pub intercept: f64,
}

impl TrendLine {
    pub fn value_at(&self, offset: i64) -> f64 {
        self.slope * offset as f64 + self.intercept
    }
}

/// Fit an ordinary least-squares line over `series`.
///
/// Returns `None` for fewer than two points. Callers must pass one point per
/// date; if every point still lands on the same offset the slope is 0 and the
/// intercept is the mean.
pub fn fit_trend(series: &[SeriesPoint]) -> Option<TrendLine> {
    if series.len() < 2 {
        return None;
    }
    let origin = series.iter().map(|p| p.date).min()?;
    let n = series.len() as f64;

    let xs: Vec<f64> = series
        .iter()
        .map(|p| (p.date - origin).num_days() as f64)
        .collect();
    let x_mean = xs.iter().sum::<f64>() / n;
    let y_mean = series.iter().map(|p| p.sessions as f64).sum::<f64>() / n;

    let (mut sxy, mut sxx) = (0.0, 0.0);
    for (x, p) in xs.iter().zip(series) {
        let dx = x - x_mean;
        sxy += dx * (p.sessions as f64 - y_mean);
        sxx += dx * dx;
    }

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    Some(TrendLine {
        origin,
        slope,
        intercept: y_mean - slope * x_mean,
    })
}

/// Tag `series` as historical and append `horizon_days` projected points.
///
/// With fewer than two points nothing is projected. Projected values are
/// rounded to the nearest integer and may be negative.
pub fn forecast(series: &[SeriesPoint], horizon_days: u32) -> ForecastSeries {
    let mut out: ForecastSeries = series
        .iter()
        .map(|p| ForecastPoint {
            date: p.date,
            sessions: p.sessions,
            kind: PointKind::Historical,
        })
        .collect();

    let (Some(trend), Some(last)) = (fit_trend(series), series.last()) else {
        return out;
    };

    let last_offset = (last.date - trend.origin).num_days();
    out.reserve(horizon_days as usize);
    for step in 1..=i64::from(horizon_days) {
        out.push(ForecastPoint {
            date: last.date + Duration::days(step),
            sessions: trend.value_at(last_offset + step).round() as i64,
            kind: PointKind::Forecast,
        });
    }
    out
}
