use colored::Colorize;
use serde::{Deserialize, Serialize};

use crate::api::UploadReceipt;

/// Terminal result for one image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub image_order: u32,
    pub success: bool,
    pub error_detail: Option<String>,
}

impl UploadOutcome {
    pub fn failed(image_order: u32, error_detail: impl Into<String>) -> Self {
        Self {
            image_order,
            success: false,
            error_detail: Some(error_detail.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedScan {
    pub image_order: u32,
    pub receipt: UploadReceipt,
}

/// Aggregate outcome of one upload run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub attempted: usize,
    pub succeeded: usize,
    /// Only unsuccessful outcomes, in upload order
    pub failures: Vec<UploadOutcome>,
    #[serde(default)]
    pub uploaded: Vec<UploadedScan>,
}

impl BatchResult {
    pub fn record_success(&mut self, image_order: u32, receipt: UploadReceipt) {
        self.attempted += 1;
        self.succeeded += 1;
        self.uploaded.push(UploadedScan { image_order, receipt });
    }

    pub fn record_failure(&mut self, image_order: u32, error_detail: impl Into<String>) {
        self.attempted += 1;
        self.failures.push(UploadOutcome::failed(image_order, error_detail));
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Get success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.attempted == 0 {
            0.0
        } else {
            (self.succeeded as f64 / self.attempted as f64) * 100.0
        }
    }

    /// Print a formatted summary to console
    pub fn print_summary(&self) {
        println!("\n{}", "=== Batch Upload Summary ===".cyan().bold());
        println!("Attempted:   {}", self.attempted);
        println!("Succeeded:   {} ✓", self.succeeded.to_string().green());
        println!("Failed:      {} ✗", self.failed().to_string().red());
        println!("Success:     {:.1}%", self.success_rate());

        for failure in &self.failures {
            println!(
                "  #{:<4} {}",
                failure.image_order,
                failure.error_detail.as_deref().unwrap_or("unknown error").yellow()
            );
        }
        println!("{}", "============================".cyan());
    }
}
