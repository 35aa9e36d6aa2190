pub mod config;
pub mod engine;
pub mod error;
pub mod forecast;
pub mod generator;
pub mod record;
pub mod schema_map;
pub mod source;

pub use engine::{
    daily_sessions, distinct_values, filter, group_by, summarize, AggregateView, Dimension,
    FilterCriteria, KpiSummary, Metric, Reducer, SeriesPoint,
};
pub use forecast::{forecast, ForecastPoint, ForecastSeries, PointKind};
pub use record::MetricRecord;
