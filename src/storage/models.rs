use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One finished upload run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchRun {
    pub id: i64,
    pub session_id: String,
    pub assessment_id: Option<i64>,
    pub student_id: Option<i64>,
    pub attempted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub completed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FailedUpload {
    pub session_id: String,
    pub image_order: u32,
    pub error_detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub total_runs: usize,
    pub total_attempted: usize,
    pub total_succeeded: usize,
    pub total_failed: usize,
}

impl LedgerStats {
    pub fn success_rate(&self) -> f64 {
        if self.total_attempted == 0 {
            0.0
        } else {
            (self.total_succeeded as f64 / self.total_attempted as f64) * 100.0
        }
    }
}
