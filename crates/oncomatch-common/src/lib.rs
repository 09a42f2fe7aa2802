//! oncomatch-common: Shared types and errors used across all Oncomatch crates.

pub mod error;
pub mod entities;

// Re-export commonly used types
pub use error::{GenomicError, Result};
pub use entities::{
    Classification, ClassificationLabel, GenomicStatus, Intent, MutationRecord, VariantAnnotation,
    VariantType,
};
