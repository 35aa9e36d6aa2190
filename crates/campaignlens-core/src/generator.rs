//! Synthetic channel-day rows for populating an empty store.

use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::record::{MetricRecord, NO_CAMPAIGN};

pub const CHANNELS: [&str; 5] = [
    "Organic Search",
    "Social Media",
    "Email",
    "Paid Ads",
    "Referral",
];

pub const PAID_CHANNEL: &str = "Paid Ads";
pub const PAID_CAMPAIGNS: [&str; 3] = ["Winter_Sale", "New_Year_Promo", "Retargeting_Q1"];
pub const EMAIL_CHANNEL: &str = "Email";
pub const EMAIL_CAMPAIGN: &str = "Newsletter_Weekly";

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Number of days to cover, ending the day before `end`.
    pub days: u32,
    pub end: NaiveDate,
    pub min_rows_per_day: u32,
    pub max_rows_per_day: u32,
}

impl GeneratorConfig {
    pub fn ending(end: NaiveDate, days: u32) -> Self {
        Self {
            days,
            end,
            min_rows_per_day: 5,
            max_rows_per_day: 10,
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn campaign_for(channel: &str, rng: &mut impl Rng) -> String {
    match channel {
        PAID_CHANNEL => PAID_CAMPAIGNS
            .choose(rng)
            .copied()
            .unwrap_or(NO_CAMPAIGN)
            .to_string(),
        EMAIL_CHANNEL => EMAIL_CAMPAIGN.to_string(),
        _ => NO_CAMPAIGN.to_string(),
    }
}

/// Generate rows day by day, oldest first.
///
/// Sessions fall in 100..=5000, conversions are 1–5% of sessions (truncated),
/// bounce rate is 30–70%. Only the paid channel carries a CTR (1–5%) and a
/// cost (sessions × a CPC of 0.20–1.50).
pub fn generate(config: &GeneratorConfig, rng: &mut impl Rng) -> Vec<MetricRecord> {
    let start = config.end - Duration::days(i64::from(config.days));
    let (lo, hi) = (
        config.min_rows_per_day.min(config.max_rows_per_day),
        config.min_rows_per_day.max(config.max_rows_per_day),
    );
    let mut records = Vec::new();

    for i in 0..config.days {
        let date = start + Duration::days(i64::from(i));
        for _ in 0..rng.gen_range(lo..=hi) {
            let channel = CHANNELS.choose(rng).copied().unwrap_or(CHANNELS[0]);
            let campaign = campaign_for(channel, rng);
            let sessions: u64 = rng.gen_range(100..=5000);
            let conversions = (sessions as f64 * rng.gen_range(0.01..0.05)).floor();
            let bounce_rate = round2(rng.gen_range(30.0..70.0));
            let paid = channel == PAID_CHANNEL;
            let engagement_or_ctr = if paid {
                round2(rng.gen_range(1.0..5.0))
            } else {
                0.0
            };
            let cost = if paid {
                round2(sessions as f64 * rng.gen_range(0.20..1.50))
            } else {
                0.0
            };

            records.push(MetricRecord {
                date,
                channel: channel.to_string(),
                campaign,
                sessions,
                conversions,
                bounce_rate,
                engagement_or_ctr,
                cost,
            });
        }
    }
    records
}

/// Reproducible generation for tests and for `POST /api/seed` with a fixed seed.
pub fn generate_seeded(config: &GeneratorConfig, seed: u64) -> Vec<MetricRecord> {
    generate(config, &mut StdRng::seed_from_u64(seed))
}
