#![doc = include_str!("../README.md")]
//!
//! # Module Structure
//!
//! - [`config`]: Engine configuration (`EngineConfig`, builder)
//! - [`cpe`]: CPE identity model (`Cpe`, `CpeBuilder`, `CpeIdentifier`, `Part`, `Attribute`)
//! - [`vuln`]: Vulnerable software records (`VulnerableSoftware`, builder, version compare)
//! - [`feed`]: NVD feed streaming parser (`FeedParser`, `IngestStats`, `ConfigNode`)
//! - [`matcher`]: Pure matching engine (`evaluate`, `matches`)
//! - [`store`]: Store write contract (`VulnerabilityStore`, `MemoryStore`)
//! - [`cache`]: Region-partitioned disk cache (`DiskCacheFactory`, `DataCache`)
//! - [`ingest`]: Ingest orchestrator (`FeedIngestor`, `FeedIngestorBuilder`)

pub mod cache;
pub mod config;
pub mod cpe;
pub mod feed;
pub mod ingest;
pub mod matcher;
pub mod store;
pub mod vuln;

// --- Public API Re-exports ---

// Configuration
pub use config::{EngineConfig, EngineConfigBuilder};

// CPE identity
pub use cpe::builder::CpeBuilder;
pub use cpe::identifier::CpeIdentifier;
pub use cpe::{Attribute, Cpe, Part};

// Vulnerable software records
pub use vuln::version::compare_versions;
pub use vuln::{VulnerableSoftware, VulnerableSoftwareBuilder};

// Feed parsing
pub use feed::node::ConfigNode;
pub use feed::{FeedParser, IngestStats};

// Matching
pub use matcher::{evaluate, matches};

// Store
pub use store::{MemoryStore, StoredVulnerability, VulnerabilityStore};

// Disk cache
pub use cache::{DataCache, DiskCacheFactory, disk_cache};

// Orchestrator
pub use ingest::{FeedIngestor, FeedIngestorBuilder, IngestReport};
