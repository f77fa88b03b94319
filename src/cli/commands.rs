use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "scan-batch")]
#[command(about = "Capture exam papers in batches and upload them for grading")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Capture a batch of scanned pages and upload them one by one
    Upload {
        /// Image files, captured in the order given
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Assessment the papers belong to
        #[arg(short, long)]
        assessment: Option<i64>,

        /// Student the papers belong to
        #[arg(short, long)]
        student: Option<i64>,

        /// Drop images from the batch during review (by capture order)
        #[arg(short, long)]
        remove: Vec<u32>,

        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List the exams uploaded for an assessment
    Exams {
        assessment: i64,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Mark an exam as the answer key of an assessment
    SetReference {
        assessment: i64,
        exam: i64,
    },

    /// Show past upload runs
    History {
        /// Number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,

        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Write a default configuration file and initialize the upload ledger
    Init,
}
