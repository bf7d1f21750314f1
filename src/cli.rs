use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nairobi_listings")]
#[command(about = "Scrape, clean and serve Nairobi property listings.")]
pub struct CommandLine {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Crawl the listing portals into a raw CSV
    Scrape {
        #[arg(long)]
        output: Option<PathBuf>,
        /// Stop each index after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
        /// Only these portals (BuyRentKenya, Jiji, Property24, PigiaMe)
        #[arg(long, value_delimiter = ',')]
        sources: Vec<String>,
    },
    /// Add numeric bedrooms, prices and price per bedroom
    Prepare {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Dedupe, fill, drop price outliers and rank locations
    Clean {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Where the per-location statistics go
        #[arg(long)]
        stats_output: Option<PathBuf>,
    },
    /// Rebuild the per-location summary from cleaned listings
    Summary {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Sale, Rent or Both
        #[arg(long, default_value = "Sale")]
        listing_type: String,
        #[arg(long, default_value_t = crate::pipeline::summary::MIN_LISTINGS)]
        min_listings: usize,
    },
    /// Report problems in a location summary
    Audit {
        #[arg(long)]
        input: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        /// Write a repaired summary
        #[arg(long)]
        fix: bool,
    },
    /// Scrape, prepare, clean, store and summarize in one go
    Pipeline {
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Run the HTTP API
    Serve {
        #[arg(long)]
        addr: Option<String>,
    },
    /// Write all stored listings to a spreadsheet
    Export {
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the listing schema as a Markdown table
    Schema,
}

impl CommandLine {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_consistent() {
        CommandLine::command().debug_assert();
    }

    #[test]
    fn audit_fix_flag() {
        let cli = CommandLine::try_parse_from(["nairobi_listings", "audit", "--fix"]).unwrap();
        assert!(matches!(cli.command, Commands::Audit { fix: true, input: None, .. }));
    }

    #[test]
    fn scrape_sources_split_on_comma() {
        let cli =
            CommandLine::try_parse_from(["nairobi_listings", "scrape", "--sources", "Jiji,PigiaMe"])
                .unwrap();
        match cli.command {
            Commands::Scrape { sources, .. } => assert_eq!(sources, vec!["Jiji", "PigiaMe"]),
            _ => panic!("expected scrape"),
        }
    }
}
