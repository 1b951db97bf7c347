//! Stat Ingest
//!
//! Batch job that runs the external NFL stat scraper, pulls the weekly stat
//! feed out of its output, and upserts players and per-game stat lines into
//! PostgreSQL.
//!
//! ## Stages
//!
//! - **SourceProcess**: spawns the scraper and captures its output
//! - **feed**: locates and parses the JSON payload
//! - **reconcile**: splits rows into unique players and game stat lines
//! - **BulkUpsertWriter**: idempotent upserts keyed by natural keys
//! - **StatStore**: storage seam with PostgreSQL and in-memory backends

pub mod config;
pub mod error;
pub mod feed;
pub mod models;
pub mod pipeline;
pub mod postgres;
pub mod reconcile;
pub mod source;
pub mod store;
pub mod writer;

pub use config::{FeedChannel, IngestConfig};
pub use error::{IngestError, Result};
pub use models::*;
pub use pipeline::{IngestPipeline, IngestSummary};
pub use postgres::PgStatStore;
pub use source::{SourceOutput, SourceProcess};
pub use store::{InMemoryStatStore, StatStore};
pub use writer::BulkUpsertWriter;
