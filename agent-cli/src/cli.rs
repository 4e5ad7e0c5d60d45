//! Command-line definition. Dispatch lives in `main.rs`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "agent")]
#[command(about = "Chat with a memory-backed agent; store and recall long-term memories")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Interactive chat. Optional first message, then stdin line by line. Exit with /exit or EOF.
    Chat {
        /// Optional first message.
        #[arg(value_name = "MESSAGE")]
        message: Option<String>,

        /// Split the reply into parts on these delimiters (tried in order). Default: newline.
        #[arg(short, long = "delimiter")]
        delimiters: Vec<String>,

        /// Also print logs to the console.
        #[arg(short, long)]
        verbose: bool,
    },

    /// Store one memory fragment.
    Remember {
        content: String,

        /// Free-form label, e.g. preference, fact, event.
        #[arg(short = 't', long = "type")]
        memory_type: Option<String>,

        /// Between 0.0 (forgotten at once) and 1.0 (never forgotten).
        #[arg(short, long)]
        importance: Option<f64>,
    },

    /// Retrieve memories related to a query, with their scores.
    Recall {
        query: String,

        #[arg(short, default_value = "5")]
        k: usize,

        #[arg(short, long, default_value = "0.6")]
        threshold: f64,

        /// Only fragments with this type.
        #[arg(short = 'T', long = "type")]
        memory_type: Option<String>,
    },
}
