//! Validation and measurement support for copy variants.
//!
//! Nothing here is used by the copy engine itself. A [`VariantRegistry`]
//! names the implementations under test; [`validate`] compares a variant
//! against a byte-by-byte reference over randomized cases, and [`measure`]
//! reports sustained throughput for one of the standard workloads.

pub mod registry;
pub mod throughput;
pub mod validate;

use thiserror::Error;

pub use registry::{CopyFn, Variant, VariantRegistry, reference_copy};
pub use throughput::{Throughput, ThroughputConfig, WorkBuffer, Workload, measure};
pub use validate::{
    AlignmentMode, CaseFailure, CaseGenerator, CopyCase, Mismatch, ValidationConfig,
    ValidationReport, validate,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    #[error("variant `{0}` is already registered")]
    DuplicateVariant(String),
    #[error("no variant named `{0}`")]
    UnknownVariant(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("workload needs a {needed} byte buffer but only {available} bytes are available")]
    BufferTooSmall { needed: usize, available: usize },
}
