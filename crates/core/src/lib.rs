//! `rostermerge-core` - participant normalization and per-source extraction.
//!
//! Session handling for a messaging backend lives outside this crate; it is
//! reached only through the [`SourceAdapter`] trait. Everything here is
//! single-threaded and owns its state per run.

pub mod adapter;
pub mod contacts;
pub mod model;
pub mod normalize;
pub mod orchestrator;
pub mod retry;

pub use adapter::{AdapterError, SourceAdapter};
pub use model::{ContactKey, ContactRecord, ExtractionOutcome, Group, RawParticipant};
pub use normalize::{NormalizationFailure, Normalized, PhoneNormalizer, Strategy};
pub use orchestrator::{
    extract_to_file, extract_to_file_with, run_extraction, run_extraction_with, ExtractError,
    ExtractOptions,
};
pub use retry::{Retryable, RetryPolicy, Sleeper, ThreadSleeper};
