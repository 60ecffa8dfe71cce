//! CLI module for docrag
//!
//! Provides command-line interface parsing for the docrag binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docrag - Document Retrieval-Augmented Generation
///
/// Ingests TXT, PDF and DOCX documents into a vector store and answers
/// questions about them with a local LLM.
#[derive(Parser, Debug)]
#[command(
    name = "docrag",
    version,
    about = "docrag - Document Retrieval-Augmented Generation",
    long_about = "Ingests TXT, PDF and DOCX documents into a vector store and answers\n\
                  questions about them with a local LLM served by Ollama.\n\n\
                  Run without arguments to start the HTTP server.",
    after_help = "EXAMPLES:\n    \
                  docrag                            # Start the server (reads docrag.toml)\n    \
                  docrag embed ./Documents          # Ingest a directory\n    \
                  docrag add \"Some text to store\"   # Store raw text\n    \
                  docrag query \"What is docrag?\"    # Ask a question\n    \
                  docrag --config my.toml stats     # Use a custom config file"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "docrag.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Start the HTTP server (default)
    Serve,

    /// Ingest every supported document in a directory
    Embed {
        /// Directory to ingest (defaults to rag.documents_dir)
        directory: Option<PathBuf>,

        /// Maximum chunk length in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Characters carried over between chunks
        #[arg(long)]
        overlap: Option<usize>,
    },

    /// Store raw text as manual input
    Add {
        /// Text to store
        text: String,
    },

    /// Answer a question from the stored documents
    Query {
        /// Question to ask
        query: String,

        /// Number of chunks to retrieve
        #[arg(short = 'n', long)]
        n_results: Option<usize>,
    },

    /// Show the number of stored chunks
    Stats,

    /// Delete every stored chunk
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
