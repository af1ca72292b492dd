//! Named model-prediction container for tournament workflows.
//!
//! Architecture:
//! ```text
//!   model runs (external)
//!        │  row ids + values
//!        ▼
//!   ┌────────────┐
//!   │ Prediction  │  merge / set / subset over a ColumnStore
//!   └────────────┘
//!        │
//!        ▼
//!   ┌────────────┐        ┌────────────┐
//!   │   codec     │        │   score     │
//!   │ parquet/csv │        │ perf / dom  │
//!   └────────────┘        └────────────┘
//! ```
//!
//! The Parquet archive is the lossless persistence path; the CSV path
//! exists for submissions and is rounded to a fixed precision.

pub mod codec;
pub mod error;
pub mod prediction;
pub mod score;
pub mod store;

pub use error::{PredictionError, Result};
pub use prediction::Prediction;
pub use score::{Dominance, ModelScore, ValidationTargets};
pub use store::ColumnStore;
