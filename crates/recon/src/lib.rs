//! `rostermerge-recon` - reconcile contact files gathered from several sources.
//!
//! The engine works on pre-loaded records ([`ReconInput`]) and returns a
//! read-only [`ReconciliationReport`]. Loading and persisting are thin
//! wrappers around it.

pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod model;
pub mod report;

pub use config::MergeConfig;
pub use engine::{load_sources, reconcile, run};
pub use error::ReconError;
pub use model::{ReconInput, ReconciliationReport, SourceContacts, SourceSummary};
pub use report::{persist, render_text};
