// CLI configuration
use clap::{Parser, Subcommand, ValueEnum};

/// vgmeta - game audio container inspector
#[derive(Parser, Debug)]
#[command(name = "vgmeta")]
#[command(about = "Inspect FSB5 and SWAV audio containers", long_about = None)]
#[command(version)]
pub struct Config {
    /// Output format
    #[arg(short, long, value_enum, default_value = "pretty", global = true)]
    pub format: OutputFormat,

    /// Quiet mode (suppress progress messages)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Accept files regardless of extension
    #[arg(long, global = true)]
    pub any_extension: bool,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for stream information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    #[default]
    Pretty,
    /// Compact JSON
    Json,
    /// Key-value pairs
    KeyValue,
    /// Table format
    Table,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the stream descriptor of one subsong
    Info {
        /// Container file path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,

        /// Subsong to open (1-based, 0 = first)
        #[arg(short, long, default_value_t = 0)]
        subsong: u32,
    },

    /// List every subsong of a container
    List {
        /// Container file path
        #[arg(value_name = "FILE")]
        file: String,
    },

    /// Detect container format
    Detect {
        /// File path(s)
        #[arg(value_name = "FILE", required = true)]
        files: Vec<String>,
    },

    /// Inspect every matching file in a directory
    Batch {
        /// Directory path
        #[arg(short, long)]
        directory: String,

        /// File pattern (e.g., "*.fsb", "*.swav")
        #[arg(short, long)]
        pattern: String,
    },
}

impl Config {
    /// Default log filter when RUST_LOG is unset
    pub fn log_filter(&self) -> &'static str {
        if self.verbose {
            "vgmeta=debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        }
    }
}
