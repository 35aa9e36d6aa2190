/// Re-export `Config` from `campaignlens-core` for use within this crate.
///
/// Environment parsing lives in the core crate so the binary and the
/// integration tests build the same struct.
pub use campaignlens_core::config::{Config, LiveFeedConfig, Theme};
