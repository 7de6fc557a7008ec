//! `invaudit-recon`: Inventory snapshot reconciliation engine.
//!
//! Pure engine crate: receives raw or canonical tables, returns canonical
//! tables, reconciliation reports and counting templates. No file, CLI or
//! HTTP dependencies.

pub mod bin_key;
pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod layout;
pub mod loader;
pub mod model;
pub mod quantity;
pub mod reconcile;
pub mod template;
pub mod text;

pub use config::LoaderConfig;
pub use engine::{normalize, reconcile, Auditor};
pub use error::ReconError;
pub use model::{CanonicalField, RawTable, ReconReport, ReportRow, Status, Table};
