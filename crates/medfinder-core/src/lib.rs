//! Medfinder Core Library
//!
//! Discovery, indexing and fuzzy search for a static collection of medical
//! reference pages organized into fixed categories.
//!
//! # Features
//! - Heuristic document discovery without a directory API
//! - Structural extraction of headings, tables and lists
//! - Inverted keyword index with per-category statistics
//! - Ranked exact and Jaro-Winkler fuzzy search with excerpts
//! - Recency-based registry merge and cross-context synchronization

pub mod category;
pub mod config;
pub mod discovery;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod index;
pub mod registry;
pub mod search;
pub mod shared;
pub mod store;
pub mod sync;

pub use category::{Category, ALL_CATEGORIES};
pub use config::Config;
pub use discovery::{DocumentProbe, ScanReport};
pub use error::{Error, MedfinderError, Result};
pub use extract::{extract_keywords, ContentExtractor, ContentRecord, Section};
pub use fetch::{fetcher_for, DocumentFetcher, FileFetcher, HttpFetcher, MemoryFetcher};
pub use html::HtmlDocument;
pub use index::{BuildReport, IndexBuilder, SearchIndex};
pub use registry::{module_id, MergeReport, ModuleRecord, ModuleRegistry};
pub use search::{jaro_winkler, QueryEngine, SearchHit, SearchOptions};
pub use shared::Shared;
pub use store::{KeyValueStore, MemoryStore, SqliteStore, StoreEvent, StoreHandle};
pub use sync::{Backup, DocumentCache, NoopCache, SyncCoordinator, UserData};

/// Default cache directory name
pub const CACHE_DIR_NAME: &str = "medfinder";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "medfinder";
