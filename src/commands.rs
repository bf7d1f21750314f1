// commands.rs
use crate::cli::Commands;
use crate::config::Config;
use crate::db::listings::{get_all_listings, replace_listings};
use crate::db::Database;
use crate::domain::{ListingType, PreparedListing, RawListing};
use crate::pipeline::audit::{audit, fix};
use crate::pipeline::clean::{clean, location_stats};
use crate::pipeline::datasets::{read_csv, read_header, read_prepared, read_raw, write_csv, write_prepared};
use crate::pipeline::prepare::prepare;
use crate::pipeline::summary::{build_summary, filter_listings, inspect, short_location, LocationSummary, MIN_LISTINGS};
use crate::pipeline::PipelineError;
use crate::router::handle;
use crate::schema::{check_header, columns, to_markdown, validate_schema};
use crate::scraper::{ListingScraper, Source, ALL_SOURCES};
use crate::spreadsheets::build_listings_workbook;
use anyhow::{anyhow, Context};
use astra::Server;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{info, warn};

pub fn run(command: Commands, mut cfg: Config) -> anyhow::Result<()> {
    match command {
        Commands::Scrape { output, max_pages, sources } => {
            if let Some(n) = max_pages {
                cfg.max_pages = n;
            }
            let sources = parse_sources(&sources)?;
            let output = output.unwrap_or_else(|| cfg.raw_csv.clone());
            scrape(&cfg, &sources, &output).map(|_| ())
        }
        Commands::Prepare { input, output } => {
            let input = input.unwrap_or_else(|| cfg.raw_csv.clone());
            let output = output.unwrap_or_else(|| cfg.prepared_csv.clone());
            prepare_file(&input, &output).map(|_| ())
        }
        Commands::Clean { input, output, stats_output } => {
            let input = input.unwrap_or_else(|| cfg.prepared_csv.clone());
            let output = output.unwrap_or_else(|| cfg.cleaned_csv.clone());
            let stats_output = stats_output.unwrap_or_else(|| cfg.location_stats_csv.clone());
            check_header(&read_header(&input)?)?;
            clean_file(read_prepared(&input)?, &output, &stats_output).map(|_| ())
        }
        Commands::Summary { input, output, listing_type, min_listings } => {
            let input = input.unwrap_or_else(|| cfg.cleaned_csv.clone());
            let output = output.unwrap_or_else(|| cfg.summary_csv.clone());
            let listing_type = ListingType::parse_filter(&listing_type).map_err(|e| anyhow!(e))?;
            summarize(&read_prepared(&input)?, listing_type, min_listings, &output)
        }
        Commands::Audit { input, output, fix: write_fix } => {
            let input = input.unwrap_or_else(|| cfg.location_stats_csv.clone());
            let output = output.unwrap_or_else(|| cfg.summary_csv.clone());
            audit_file(&input, write_fix.then_some(output.as_path()))
        }
        Commands::Pipeline { max_pages } => {
            if let Some(n) = max_pages {
                cfg.max_pages = n;
            }
            pipeline(&cfg)
        }
        Commands::Serve { addr } => serve(&cfg, addr.as_deref().unwrap_or(&cfg.listen_addr)),
        Commands::Export { output } => {
            let output = output.unwrap_or_else(|| cfg.export_xlsx.clone());
            export(&cfg, &output)
        }
        Commands::Schema => {
            validate_schema(columns())?;
            print!("{}", to_markdown(columns()));
            Ok(())
        }
    }
}

fn open_db(cfg: &Config) -> anyhow::Result<Database> {
    let db = Database::new(cfg.db_path.clone());
    db.init()
        .with_context(|| format!("initializing database {}", cfg.db_path))?;
    Ok(db)
}

fn parse_sources(names: &[String]) -> anyhow::Result<Vec<Source>> {
    if names.is_empty() {
        return Ok(ALL_SOURCES.to_vec());
    }
    names
        .iter()
        .map(|n| n.parse::<Source>().map_err(anyhow::Error::from))
        .collect()
}

fn scrape(cfg: &Config, sources: &[Source], output: &Path) -> anyhow::Result<Vec<RawListing>> {
    let db = open_db(cfg)?;
    let scraper = ListingScraper::new(cfg)?;
    let rows = scraper.run_scrape(&db, sources)?;
    if rows.is_empty() {
        warn!("Scrape returned no listings");
    }
    write_csv(output, &rows)?;
    Ok(rows)
}

fn prepare_file(input: &Path, output: &Path) -> anyhow::Result<Vec<PreparedListing>> {
    let rows = prepare(&read_raw(input)?);
    write_prepared(output, &rows)?;
    Ok(rows)
}

fn clean_file(rows: Vec<PreparedListing>, output: &Path, stats_output: &Path) -> anyhow::Result<Vec<PreparedListing>> {
    let outcome = clean(rows);
    if outcome.rows.is_empty() {
        return Err(PipelineError::Empty("cleaning").into());
    }
    info!(
        rows = outcome.rows.len(),
        duplicates = outcome.duplicates_dropped,
        bedrooms_filled = outcome.bedrooms_filled,
        unpriced = outcome.unpriced_dropped,
        outliers = outcome.outliers_dropped,
        "Cleaned"
    );
    write_prepared(output, &outcome.rows)?;
    write_csv(stats_output, &location_stats(&outcome.rows))?;
    Ok(outcome.rows)
}

fn summarize(
    rows: &[PreparedListing],
    listing_type: Option<ListingType>,
    min_listings: usize,
    output: &Path,
) -> anyhow::Result<()> {
    let overview = inspect(rows);
    info!(
        rows = overview.rows,
        by_type = ?overview.by_listing_type,
        price_min = ?overview.price_min,
        price_median = ?overview.price_median,
        price_max = ?overview.price_max,
        "Dataset overview"
    );

    let filtered = filter_listings(rows, listing_type);
    if filtered.is_empty() {
        return Err(PipelineError::Empty("price filtering").into());
    }
    let summary = build_summary(&filtered, min_listings);
    write_csv(output, &summary)?;

    for s in summary.iter().take(10) {
        info!(
            rank = ?s.affordability_rank,
            location = short_location(&s.location),
            avg_price = ?s.avg_price,
            per_bedroom = ?s.avg_price_per_bedroom,
            "Most affordable"
        );
    }
    Ok(())
}

fn audit_file(input: &Path, fix_output: Option<&Path>) -> anyhow::Result<()> {
    let rows: Vec<LocationSummary> = read_csv(input)?;
    println!("{}", audit(&rows));

    if let Some(output) = fix_output {
        let (fixed, notes) = fix(rows);
        for note in &notes {
            println!("  ✓ {note}");
        }
        write_csv(output, &fixed)?;
        println!("  Saved {} rows to {}", fixed.len(), output.display());
    }
    Ok(())
}

fn pipeline(cfg: &Config) -> anyhow::Result<()> {
    let started = std::time::Instant::now();
    info!("Pipeline started");

    let raw = scrape(cfg, &ALL_SOURCES, &cfg.raw_csv)?;
    if raw.is_empty() {
        return Err(PipelineError::Empty("scraping").into());
    }
    let prepared = prepare_file(&cfg.raw_csv, &cfg.prepared_csv)?;
    let cleaned = clean_file(prepared, &cfg.cleaned_csv, &cfg.location_stats_csv)?;

    let db = open_db(cfg)?;
    replace_listings(&db, &cleaned)?;

    summarize(&cleaned, Some(ListingType::Sale), MIN_LISTINGS, &cfg.summary_csv)?;

    info!(elapsed = ?started.elapsed(), listings = cleaned.len(), "Pipeline complete");
    Ok(())
}

fn serve(cfg: &Config, addr: &str) -> anyhow::Result<()> {
    let db = open_db(cfg)?;
    let addr: SocketAddr = addr
        .parse()
        .with_context(|| format!("invalid listen address {addr}"))?;
    info!("Starting server at http://{addr}");

    let server = Server::bind(addr).max_workers(cfg.max_workers);

    let result = server.serve(move |req, _info| match handle(req, &db) {
        Ok(resp) => resp,
        Err(err) => crate::responses::error_to_response(err),
    });

    if let Err(e) = result {
        warn!("Server ended with error: {e}");
    }

    info!("Server shut down cleanly.");
    Ok(())
}

fn export(cfg: &Config, output: &Path) -> anyhow::Result<()> {
    let db = open_db(cfg)?;
    let listings = get_all_listings(&db)?;
    let bytes = build_listings_workbook(&listings)?;
    std::fs::write(output, bytes).with_context(|| format!("writing {}", output.display()))?;
    info!(rows = listings.len(), path = %output.display(), "Exported listings");
    Ok(())
}
