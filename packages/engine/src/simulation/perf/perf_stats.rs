use serde::Serialize;

use crate::spatial::CacheStats;

/// Report of one rendered plane.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub threads: usize,
    pub simd: &'static str,
    pub draft: bool,
    pub pass1_ms: f64,
    pub pass2_ms: f64,
    /// Sum of row costs (fixed point, 1.0 = 65536).
    pub load_total: i64,
    /// `[begin, end)` rows of each worker for the last pass run.
    pub band_rows: Vec<[usize; 2]>,
    /// Cost of each band after rebalancing. Empty in draft mode.
    pub band_loads: Vec<i64>,
    pub cache: CacheStats,
}

impl FrameStats {
    pub(crate) fn reset(&mut self) {
        *self = FrameStats::default();
    }

    pub fn total_ms(&self) -> f64 {
        self.pass1_ms + self.pass2_ms
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}
