use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::{info, warn};

use campaignlens_core::error::RecordError;
use campaignlens_core::record::{parse_record_date, MetricRecord};
use campaignlens_core::source::LoadedRecords;

use crate::schema::init_sql;

/// Columns in the order every SELECT and INSERT below uses them.
const RECORD_COLUMNS: &str =
    "date, channel, campaign, sessions, conversions, bounce_rate, engagement_or_ctr, cost";

/// DuckDB-backed store for channel-day rows.
///
/// DuckDB is single-writer, so the connection sits behind
/// `Arc<tokio::sync::Mutex<_>>`; the struct is shared across Axum handlers
/// through `AppState`.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

/// A row as DuckDB hands it back, before validation.
struct RawRow {
    date: String,
    channel: String,
    campaign: String,
    sessions: i64,
    conversions: f64,
    bounce_rate: f64,
    engagement_or_ctr: f64,
    cost: f64,
}

impl RawRow {
    fn into_record(self) -> Result<MetricRecord, RecordError> {
        if self.sessions < 0 {
            return Err(RecordError::Negative {
                field: "sessions",
                value: self.sessions as f64,
            });
        }
        let record = MetricRecord {
            date: parse_record_date(&self.date)?,
            channel: self.channel,
            campaign: self.campaign,
            sessions: self.sessions as u64,
            conversions: self.conversions,
            bounce_rate: self.bounce_rate,
            engagement_or_ctr: self.engagement_or_ctr,
            cost: self.cost,
        };
        record.validate()?;
        Ok(record)
    }
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path` and create the
    /// `channel_metrics` table if it is missing.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** database. Data is discarded on drop.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Execute `SELECT 1` as a lightweight liveness check for `/health`.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Read every row in insertion order.
    ///
    /// Rows with an unparseable date or out-of-range numbers are dropped and
    /// counted in [`LoadedRecords::rejected`]; the engine never sees them.
    pub async fn load_records(&self) -> Result<LoadedRecords> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT CAST(date AS VARCHAR), channel, campaign, sessions, \
                    conversions, bounce_rate, engagement_or_ctr, cost \
             FROM channel_metrics \
             ORDER BY id",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(RawRow {
                date: row.get(0)?,
                channel: row.get(1)?,
                campaign: row.get(2)?,
                sessions: row.get(3)?,
                conversions: row.get(4)?,
                bounce_rate: row.get(5)?,
                engagement_or_ctr: row.get(6)?,
                cost: row.get(7)?,
            })
        })?;

        let mut loaded = LoadedRecords::default();
        for row in rows {
            match row?.into_record() {
                Ok(record) => loaded.records.push(record),
                Err(e) => {
                    warn!(error = %e, "Skipping invalid channel_metrics row");
                    loaded.rejected += 1;
                }
            }
        }
        Ok(loaded)
    }

    /// Append `records` in a single transaction. No-op for an empty slice.
    pub async fn insert_records(&self, records: &[MetricRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        insert_all(&tx, records)?;
        tx.commit()?;
        info!("Inserted {} rows into channel_metrics", records.len());
        Ok(())
    }

    /// Delete every row and insert `records`, atomically.
    pub async fn replace_records(&self, records: &[MetricRecord]) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute_batch("DELETE FROM channel_metrics")?;
        insert_all(&tx, records)?;
        tx.commit()?;
        info!("Replaced channel_metrics with {} rows", records.len());
        Ok(())
    }

    pub async fn count_records(&self) -> Result<u64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT COUNT(*) FROM channel_metrics")?;
        let count: i64 = stmt.query_row([], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that plant rows the typed API refuses
    /// to write. Production code should use the methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}

fn insert_all(conn: &Connection, records: &[MetricRecord]) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO channel_metrics ({RECORD_COLUMNS}) \
         VALUES (CAST(?1 AS DATE), ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ))?;
    for r in records {
        stmt.execute(duckdb::params![
            r.date.format("%Y-%m-%d").to_string(),
            r.channel,
            r.campaign,
            r.sessions as i64,
            r.conversions,
            r.bounce_rate,
            r.engagement_or_ctr,
            r.cost,
        ])?;
    }
    Ok(())
}
