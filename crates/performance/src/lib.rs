//! Periodic variation scoring and winner selection.

pub mod evaluator;

pub use evaluator::{EvaluationReport, PerformanceEvaluator};
