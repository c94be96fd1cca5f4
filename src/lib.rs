//! skinsweep - Batch skin-price aggregator for case-site catalogs
//!
//! Resolves item prices across several remote catalogs and writes them back
//! into a shared workbook, one price column per source.

pub mod batch;
pub mod config;
pub mod error;
pub mod identity;
pub mod market;
pub mod page;
pub mod store;

pub use batch::{BatchController, BatchOptions, RunSummary, SheetSelection, UNMATCHED_SENTINEL};
pub use config::Config;
pub use error::{ResolveError, StoreError};
pub use identity::{normalize, SkinIdentity, WearTier};
pub use market::{Outcome, PriceResult, SourceAdapter, SourceId};
