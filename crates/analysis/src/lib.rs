//! Whole-set analysis the rename engine consults: the cross-module
//! inheritance graph that groups virtual methods which must share a name,
//! and summary metrics over a finished run.

pub mod inherit;
pub mod metrics;

pub use inherit::{InheritMap, MethodGroup};
pub use metrics::{collect_metrics, RunMetrics};
