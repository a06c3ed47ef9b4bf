//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use pdfdesk_core::PageRange;

/// Send PDFs to a processing service and save the returned artifact.
#[derive(Parser, Debug)]
#[command(name = "pdfdesk")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Service base URL (overrides the PDF_API_URL environment variable)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Directory to save the returned artifact to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Merge two or more PDFs into a single document
    Merge {
        /// PDF files, in merge order
        #[arg(required = true, num_args = 2..)]
        files: Vec<PathBuf>,
    },
    /// Split one PDF into individual pages or a page range
    Split {
        /// The PDF file to split
        file: PathBuf,
        /// Inclusive page range as start-end (e.g. 5-9); omit to split
        /// every page
        #[arg(long, value_parser = parse_page_range)]
        pages: Option<PageRange>,
    },
    /// Extract embedded images from one or more PDFs into a ZIP
    ExtractImages {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

/// Parses `start-end` into a validated [`PageRange`].
fn parse_page_range(raw: &str) -> Result<PageRange, String> {
    let (start, end) = raw
        .split_once('-')
        .ok_or_else(|| format!("expected start-end (e.g. 5-9), got {raw}"))?;
    let start: u32 = start
        .trim()
        .parse()
        .map_err(|_| format!("start page is not a number: {start}"))?;
    let end: u32 = end
        .trim()
        .parse()
        .map_err(|_| format!("end page is not a number: {end}"))?;
    PageRange::new(start, end).map_err(|e| e.to_string())
}
