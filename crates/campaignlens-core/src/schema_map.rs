//! Fixed source-column → canonical-field tables.
//!
//! Every adapter that reads foreign rows (CSV import, live analytics API)
//! renames columns through these tables before a [`MetricRecord`] is built,
//! so the engine only ever sees the canonical shape.

use crate::error::RecordError;
use crate::record::{parse_record_date, MetricRecord, NO_CAMPAIGN};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Date,
    Channel,
    Campaign,
    Sessions,
    Conversions,
    BounceRate,
    EngagementOrCtr,
    Cost,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Date,
        Field::Channel,
        Field::Campaign,
        Field::Sessions,
        Field::Conversions,
        Field::BounceRate,
        Field::EngagementOrCtr,
        Field::Cost,
    ];

    /// Canonical column name, identical to the `MetricRecord` field name.
    pub fn name(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Channel => "channel",
            Field::Campaign => "campaign",
            Field::Sessions => "sessions",
            Field::Conversions => "conversions",
            Field::BounceRate => "bounce_rate",
            Field::EngagementOrCtr => "engagement_or_ctr",
            Field::Cost => "cost",
        }
    }
}

/// Columns of the flat SQL table written by the legacy generator scripts.
pub const LEGACY_SQL_FIELDS: &[(&str, Field)] = &[
    ("date", Field::Date),
    ("source", Field::Channel),
    ("campaign", Field::Campaign),
    ("campaign_name", Field::Campaign),
    ("sessions", Field::Sessions),
    ("conversions", Field::Conversions),
    ("bounce_rate", Field::BounceRate),
    ("ctr", Field::EngagementOrCtr),
    ("cost", Field::Cost),
];

/// Title-case headers used by spreadsheet exports of the dashboard.
pub const DISPLAY_FIELDS: &[(&str, Field)] = &[
    ("Date", Field::Date),
    ("Source", Field::Channel),
    ("Channel", Field::Channel),
    ("Campaign", Field::Campaign),
    ("Sessions", Field::Sessions),
    ("Conversions", Field::Conversions),
    ("Bounce_Rate", Field::BounceRate),
    ("CTR", Field::EngagementOrCtr),
    ("Engagement_Rate", Field::EngagementOrCtr),
    ("Cost", Field::Cost),
];

/// Dimension and metric names of the live analytics reporting API.
///
/// `percentNewSessions` stands in for engagement; the API has no CTR or cost.
pub const LIVE_FEED_FIELDS: &[(&str, Field)] = &[
    ("ga:date", Field::Date),
    ("ga:source", Field::Channel),
    ("ga:campaign", Field::Campaign),
    ("ga:sessions", Field::Sessions),
    ("ga:transactions", Field::Conversions),
    ("ga:bounceRate", Field::BounceRate),
    ("ga:percentNewSessions", Field::EngagementOrCtr),
];

/// Resolve a source column name to a canonical field.
///
/// Exact matches in the canonical, legacy, display and live-feed tables win;
/// after that the canonical names are matched case-insensitively.
pub fn resolve_column(name: &str) -> Option<Field> {
    let name = name.trim();
    if let Some(field) = Field::ALL.iter().copied().find(|f| f.name() == name) {
        return Some(field);
    }
    for table in [LEGACY_SQL_FIELDS, DISPLAY_FIELDS, LIVE_FEED_FIELDS] {
        if let Some((_, field)) = table.iter().find(|(col, _)| *col == name) {
            return Some(*field);
        }
    }
    Field::ALL
        .iter()
        .copied()
        .find(|f| f.name().eq_ignore_ascii_case(name))
}

/// Assembles a [`MetricRecord`] from raw string cells keyed by [`Field`].
///
/// Date, channel and sessions are required. A missing or blank campaign maps
/// to [`NO_CAMPAIGN`]; missing rates, conversions and cost default to 0.
#[derive(Debug, Default)]
pub struct RecordBuilder {
    date: Option<String>,
    channel: Option<String>,
    campaign: Option<String>,
    sessions: Option<String>,
    conversions: Option<String>,
    bounce_rate: Option<String>,
    engagement_or_ctr: Option<String>,
    cost: Option<String>,
}

impl RecordBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, field: Field, raw: impl Into<String>) -> &mut Self {
        let slot = match field {
            Field::Date => &mut self.date,
            Field::Channel => &mut self.channel,
            Field::Campaign => &mut self.campaign,
            Field::Sessions => &mut self.sessions,
            Field::Conversions => &mut self.conversions,
            Field::BounceRate => &mut self.bounce_rate,
            Field::EngagementOrCtr => &mut self.engagement_or_ctr,
            Field::Cost => &mut self.cost,
        };
        *slot = Some(raw.into());
        self
    }

    pub fn build(self) -> Result<MetricRecord, RecordError> {
        let date = parse_record_date(&required(self.date, Field::Date)?)?;
        let channel = required(self.channel, Field::Channel)?.trim().to_string();
        let campaign = match self.campaign.as_deref().map(str::trim) {
            None | Some("") | Some("(not set)") | Some("(none)") => NO_CAMPAIGN.to_string(),
            Some(c) => c.to_string(),
        };
        let sessions = parse_count(&required(self.sessions, Field::Sessions)?)?;

        let record = MetricRecord {
            date,
            channel,
            campaign,
            sessions,
            conversions: parse_optional(self.conversions, Field::Conversions)?,
            bounce_rate: parse_optional(self.bounce_rate, Field::BounceRate)?,
            engagement_or_ctr: parse_optional(self.engagement_or_ctr, Field::EngagementOrCtr)?,
            cost: parse_optional(self.cost, Field::Cost)?,
        };
        record.validate()?;
        Ok(record)
    }
}

fn required(value: Option<String>, field: Field) -> Result<String, RecordError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(RecordError::MissingField(field.name())),
    }
}

fn parse_number(raw: &str, field: Field) -> Result<f64, RecordError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RecordError::InvalidNumber {
            field: field.name(),
            raw: raw.to_string(),
        })
}

fn parse_optional(raw: Option<String>, field: Field) -> Result<f64, RecordError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(0.0),
        Some(v) => parse_number(v, field),
    }
}

/// Session counts arrive as `"1200"` or, from spreadsheets, `"1200.0"`.
fn parse_count(raw: &str) -> Result<u64, RecordError> {
    if let Ok(n) = raw.trim().parse::<u64>() {
        return Ok(n);
    }
    let value = parse_number(raw, Field::Sessions)?;
    if !value.is_finite() {
        return Err(RecordError::NotFinite { field: "sessions" });
    }
    if value < 0.0 {
        return Err(RecordError::Negative {
            field: "sessions",
            value,
        });
    }
    if value.fract() != 0.0 {
        return Err(RecordError::InvalidNumber {
            field: "sessions",
            raw: raw.to_string(),
        });
    }
    Ok(value as u64)
}
