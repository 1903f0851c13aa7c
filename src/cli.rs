use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mask PII in a text file and write the result as JSON
    Mask {
        /// Path to the input text file
        input: String,

        /// Output file path
        #[arg(default_value = "output.json", short)]
        output_file: String,

        /// JSON file with external model detections to merge with the
        /// built-in pattern source
        #[arg(short, long)]
        spans: Option<String>,
    },

    /// Run a fixture bundle and report detection quality
    Eval {
        /// Path to the JSON fixture bundle
        tests_path: String,

        /// Write the full report as JSON to this path
        #[arg(short, long)]
        output_file: Option<String>,

        /// Evaluate only the first N fixtures
        #[arg(long)]
        limit: Option<usize>,

        /// Print the masked text of every case
        #[arg(long)]
        show_masked: bool,
    },
}
