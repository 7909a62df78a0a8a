//! Exercise metric kinds and snapshots.
//!
//! Metrics arrive from the external exercise service as sparse snapshots:
//! any field may be absent in any given delivery. The engine never
//! aggregates them -- it formats whatever is present for display.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A kind of metric the exercise service may support.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    HeartRate,
    Distance,
    Steps,
}

/// Sparse metric delivery from the exercise service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Most recent heart rate sample in beats per minute.
    #[serde(default)]
    pub heart_rate_bpm: Option<f64>,
    /// Total distance in meters.
    #[serde(default)]
    pub distance_meters: Option<f64>,
    /// Total step count.
    #[serde(default)]
    pub steps: Option<u64>,
}

impl MetricSnapshot {
    pub fn is_empty(&self) -> bool {
        self.heart_rate_bpm.is_none() && self.distance_meters.is_none() && self.steps.is_none()
    }
}

/// Which metric kinds the bound service can deliver.
pub type Capabilities = HashSet<MetricKind>;
