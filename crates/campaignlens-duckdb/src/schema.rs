/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `CAMPAIGNLENS_DUCKDB_MEMORY`, default `"1GB"`). Always set; DuckDB
/// otherwise takes 80% of system RAM.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- CHANNEL METRICS (one row per channel-day)
-- ===========================================
-- `id` only preserves insertion order for reads; nothing references it.
CREATE SEQUENCE IF NOT EXISTS channel_metrics_id_seq START 1;
CREATE TABLE IF NOT EXISTS channel_metrics (
    id                  BIGINT PRIMARY KEY DEFAULT nextval('channel_metrics_id_seq'),
    date                DATE NOT NULL,
    channel             VARCHAR NOT NULL,
    campaign            VARCHAR NOT NULL DEFAULT 'None',
    sessions            BIGINT NOT NULL,
    conversions         DOUBLE NOT NULL DEFAULT 0,
    bounce_rate         DOUBLE NOT NULL DEFAULT 0,      -- percentage 0-100
    engagement_or_ctr   DOUBLE NOT NULL DEFAULT 0,      -- CTR for paid channels, else engagement
    cost                DOUBLE NOT NULL DEFAULT 0       -- 0 for unpaid channels
);
CREATE INDEX IF NOT EXISTS idx_channel_metrics_date ON channel_metrics(date);
"#
    )
}
