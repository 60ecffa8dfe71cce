//! Colored output helpers for CLI
//!
//! Every helper has a plain-text fallback used with `--no-color`.

use crate::types::{IngestReport, QueryResult};
use owo_colors::OwoColorize;
use std::io::{self, Write};

/// Width of the file name column in ingestion reports
const NAME_COLUMN: usize = 32;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    /// Create a new output helper with colors enabled
    pub fn new() -> Self {
        Self { colored: true }
    }

    /// Create a new output helper with colors disabled
    pub fn no_color() -> Self {
        Self { colored: false }
    }

    /// Print the startup banner
    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "docrag".bright_cyan().bold(),
                version.dimmed(),
                "Document retrieval-augmented generation".bright_white()
            );
        } else {
            println!(
                "\n   docrag {}\n   Document retrieval-augmented generation\n",
                version
            );
        }
    }

    /// Print a success message with a checkmark
    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    /// Print a header for a section
    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Print a key-value pair
    pub fn kv(&self, key: &str, value: &str) {
        if self.colored {
            println!("    {}: {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {}: {}", key, value);
        }
    }

    /// Print a list item
    pub fn list_item(&self, item: &str) {
        if self.colored {
            println!("    {} {}", "•".blue(), item);
        } else {
            println!("    - {}", item);
        }
    }

    /// Print a hint/tip message
    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }

    /// Prompt for confirmation (returns true if user confirms)
    pub fn confirm(&self, message: &str) -> bool {
        if self.colored {
            print!(
                "  {} {} [y/N]: ",
                "?".bright_yellow().bold(),
                message.bright_white()
            );
        } else {
            print!("  [?] {} [y/N]: ", message);
        }

        io::stdout().flush().ok();

        let mut input = String::new();
        if io::stdin().read_line(&mut input).is_ok() {
            is_yes(&input)
        } else {
            false
        }
    }

    /// Print a per-file chunk table followed by the total
    pub fn ingest_report(&self, report: &IngestReport) {
        if report.files.is_empty() {
            self.warning("No supported documents found");
            return;
        }

        let rule = "─".repeat(NAME_COLUMN + 8);
        if self.colored {
            println!(
                "    {}",
                format!("{:<width$} {:>7}", "File", "Chunks", width = NAME_COLUMN)
                    .bright_white()
                    .bold()
            );
            println!("    {}", rule.dimmed());
        } else {
            println!("    {:<width$} {:>7}", "File", "Chunks", width = NAME_COLUMN);
            println!("    {}", "-".repeat(NAME_COLUMN + 8));
        }

        for (file, chunks) in &report.files {
            let row = format!("{:<width$} {:>7}", file, chunks, width = NAME_COLUMN);
            if self.colored && *chunks == 0 {
                println!("    {}", row.yellow());
            } else {
                println!("    {}", row);
            }
        }

        self.success(&format!(
            "Embedded {} chunks from {} files",
            report.total_chunks,
            report.files.len()
        ));
    }

    /// Print a generated answer and where it came from
    pub fn answer(&self, result: &QueryResult) {
        self.header("Answer");
        println!("\n    {}\n", result.answer.trim().replace('\n', "\n    "));

        if result.sources.is_empty() {
            return;
        }
        self.kv("chunks used", &result.chunks_used.to_string());
        self.kv("sources", "");
        for source in &result.sources {
            self.list_item(source);
        }
    }

    /// Print newline
    pub fn newline(&self) {
        println!();
    }
}

fn is_yes(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "y" | "yes")
}
