//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use strata::FragmentKind;

/// Strata: fragment extraction and schema drift tracking
#[derive(Parser)]
#[command(name = "strata")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding stored files, fragments and schema versions
    #[arg(long, global = true, env = "STRATA_DATA_DIR", default_value = ".strata")]
    pub data_dir: PathBuf,

    /// JSON configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract fragments from a file without storing anything
    Extract {
        /// Path to the text file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Store a file and its extracted fragments
    Ingest {
        /// Path to the file to upload
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Source the file belongs to
        #[arg(short, long)]
        source: Option<String>,

        /// MIME type (default: guessed from the file extension)
        #[arg(long)]
        content_type: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Infer and store the next schema version for a source
    Infer {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the latest schema version of a source
    Latest {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List every schema version of a source
    Versions {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two stored schema versions of a source
    Compare {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Older version number
        #[arg(long)]
        v1: u32,

        /// Newer version number
        #[arg(long)]
        v2: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare two schema JSON files
    Diff {
        /// Older schema file
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Newer schema file
        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List uploaded files, newest first
    Files {
        /// Maximum number of files (1-500)
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Number of files to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the fragments stored for a file
    Fragments {
        #[arg(value_name = "FILE_ID")]
        file_id: String,

        /// Only show one kind (json, csv, kv, html, text)
        #[arg(short, long)]
        kind: Option<FragmentKind>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List sources and their file counts
    Sources {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
