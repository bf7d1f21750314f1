// scraper.rs
use crate::config::Config;
use crate::db::connection::Database;
use crate::db::scrapes::{end_scrape_run, start_scrape_run};
use crate::domain::{ListingType, RawListing};
use crate::scraper::sources::Source;
use crate::scraper::ScraperError;
use chrono::Local;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::StatusCode;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, error, info, warn};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36";

const MAX_ATTEMPTS: u64 = 5;
const MAX_BACKOFF_SECS: u64 = 10;
const JITTER_MAX_SECS: u64 = 2;
const MAX_CONSECUTIVE_FAILURES: usize = 3;

pub struct ListingScraper {
    client: Client,
    max_pages: usize,
    delay_ms: (u64, u64),
}

#[derive(Debug, Default)]
pub struct CrawlResult {
    pub rows: Vec<RawListing>,
    pub pages_fetched: usize,
    /// Indexes abandoned after too many failed pages.
    pub failures: Vec<String>,
}

impl CrawlResult {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

impl ListingScraper {
    pub fn new(config: &Config) -> Result<Self, ScraperError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,*/*;q=0.8"),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

        let mut builder = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_secs));

        if let Some(proxy) = &config.proxy {
            let proxy = reqwest::Proxy::all(proxy.as_str())
                .map_err(|e| ScraperError::Config(format!("invalid proxy: {e}")))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;

        let lo = config.delay_min_ms.min(config.delay_max_ms);
        let hi = config.delay_min_ms.max(config.delay_max_ms);
        Ok(Self {
            client,
            max_pages: config.max_pages,
            delay_ms: (lo, hi),
        })
    }

    /// Crawls every portal for sale and rent listings, merges the results,
    /// and records the run in `scrape_runs`.
    pub fn run_scrape(&self, db: &Database, sources: &[Source]) -> Result<Vec<RawListing>, ScraperError> {
        self.run_scrape_with(db, sources, &mut |source, url| self.fetch_html(url, source.referer()))
    }

    fn run_scrape_with(
        &self,
        db: &Database,
        sources: &[Source],
        fetch: &mut dyn FnMut(Source, &str) -> Result<String, ScraperError>,
    ) -> Result<Vec<RawListing>, ScraperError> {
        let label = sources
            .iter()
            .map(|s| s.name())
            .collect::<Vec<_>>()
            .join(",");
        let run_id = db
            .with_conn(|conn| start_scrape_run(conn, &label, now_unix()))
            .map_err(|e| ScraperError::Storage(e.to_string()))?;

        info!(sources = %label, max_pages = self.max_pages, "Scrape started");

        let mut all = Vec::new();
        let mut pages = 0;
        let mut failures = Vec::new();
        for source in sources {
            for listing_type in [ListingType::Sale, ListingType::Rent] {
                let result = self.crawl_with(*source, listing_type, fetch);
                if !result.is_complete() {
                    error!(source = %source, %listing_type, "Crawl incomplete");
                }
                pages += result.pages_fetched;
                all.extend(result.rows);
                failures.extend(result.failures);
                self.pause();
            }
        }

        let rows = dedup(all);
        let success = failures.is_empty();
        let message = (!success).then(|| failures.join("; "));

        db.with_conn(|conn| {
            end_scrape_run(conn, run_id, now_unix(), pages, rows.len(), success, message)
        })
        .map_err(|e| ScraperError::Storage(e.to_string()))?;

        info!(rows = rows.len(), pages, success, "Scrape complete");
        Ok(rows)
    }

    fn crawl_with(
        &self,
        source: Source,
        listing_type: ListingType,
        fetch: &mut dyn FnMut(Source, &str) -> Result<String, ScraperError>,
    ) -> CrawlResult {
        info!(source = %source, %listing_type, "Crawling");
        let mut result = CrawlResult::default();

        for path in source.index_paths(listing_type) {
            self.crawl_index(source, listing_type, &path, fetch, &mut result);
        }

        info!(source = %source, %listing_type, rows = result.rows.len(), "Crawl done");
        result
    }

    fn crawl_index(
        &self,
        source: Source,
        listing_type: ListingType,
        path: &str,
        fetch: &mut dyn FnMut(Source, &str) -> Result<String, ScraperError>,
        result: &mut CrawlResult,
    ) {
        let mut page = 1;
        let mut consecutive_failures = 0;
        let mut seen_pages = HashSet::new();
        let mut index_rows = 0;

        while page <= self.max_pages {
            let url = source.page_url(path, page);
            debug!("p{page}: {url}");

            let parsed = fetch(source, &url).and_then(|html| source.parse_page(&html, page));

            match parsed {
                Ok(parsed) => {
                    consecutive_failures = 0;
                    result.pages_fetched += 1;

                    if parsed.rows.is_empty() {
                        info!("No listings on p{page}, stopping");
                        break;
                    }
                    // portals sometimes serve the last page again for any page past the end
                    let fingerprint = parsed
                        .rows
                        .iter()
                        .filter_map(RawListing::dedup_key)
                        .collect::<Vec<_>>()
                        .join("|");
                    if !seen_pages.insert(fingerprint) {
                        info!("Page {page} repeats an earlier page, stopping");
                        break;
                    }

                    info!("{} listings on p{page}", parsed.rows.len());
                    let scraped_at = Local::now().naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
                    index_rows += parsed.rows.len();
                    result.rows.extend(parsed.rows.into_iter().map(|mut r| {
                        r.source = source.name().to_string();
                        r.listing_type = listing_type.to_string();
                        r.scraped_at = scraped_at.clone();
                        r
                    }));

                    if !parsed.has_next {
                        break;
                    }
                    if let Some(total) = parsed.total {
                        if index_rows >= total {
                            break;
                        }
                    }
                    page += 1;
                }
                Err(e) => {
                    consecutive_failures += 1;
                    warn!("Page {page} failed (attempt {consecutive_failures}): {e}");
                    if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                        warn!("Too many failures, aborting {source} {listing_type}");
                        result
                            .failures
                            .push(format!("{source} {listing_type} {path} p{page}: {e}"));
                        break;
                    }
                }
            }
            self.pause();
        }
    }

    /// GET with retries and jittered backoff.
    fn fetch_html(&self, url: &str, referer: Option<&'static str>) -> Result<String, ScraperError> {
        let mut last_err = None;

        for attempt in 1..=MAX_ATTEMPTS {
            let start = std::time::Instant::now();

            match self.try_fetch_html(url, referer) {
                Ok(html) => {
                    debug!("Fetched {url} on attempt {attempt} in {:?}", start.elapsed());
                    return Ok(html);
                }
                Err(e) => {
                    warn!("Attempt {attempt} for {url} failed in {:?}: {e}", start.elapsed());
                    last_err = Some(e);

                    if attempt < MAX_ATTEMPTS {
                        let base = std::cmp::min(2 * attempt, MAX_BACKOFF_SECS);
                        let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_SECS);
                        std::thread::sleep(Duration::from_secs(base + jitter));
                    }
                }
            }
        }

        Err(last_err.unwrap_or_else(|| ScraperError::Network("retry loop failed".into())))
    }

    fn try_fetch_html(&self, url: &str, referer: Option<&'static str>) -> Result<String, ScraperError> {
        let mut req = self.client.get(url);
        if let Some(r) = referer {
            req = req.header(REFERER, r);
        }

        let resp = req
            .send()
            .map_err(|e| ScraperError::Network(e.to_string()))?;
        let status = resp.status();

        if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ScraperError::Blocked(format!("HTTP {status}: {url}")));
        }
        if !status.is_success() {
            return Err(ScraperError::Network(format!("HTTP {status}: {url}")));
        }

        resp.text()
            .map_err(|e| ScraperError::Network(e.to_string()))
    }

    fn pause(&self) {
        let (lo, hi) = self.delay_ms;
        if hi == 0 {
            return;
        }
        let ms = rand::thread_rng().gen_range(lo..=hi);
        std::thread::sleep(Duration::from_millis(ms));
    }
}

/// Merges listings seen by several crawls: URL first, else title+price.
/// Rows with neither are dropped.
pub fn dedup(rows: Vec<RawListing>) -> Vec<RawListing> {
    let before = rows.len();
    let mut seen = HashSet::new();
    let out: Vec<RawListing> = rows
        .into_iter()
        .filter(|r| match r.dedup_key() {
            Some(k) => seen.insert(k),
            None => false,
        })
        .collect();
    info!("Dedup: {before} -> {}", out.len());
    out
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::scrapes::get_recent_scrapes;
    use crate::tests::utils::setup_test_db;

    fn raw(url: &str, title: &str, price: &str) -> RawListing {
        RawListing {
            url: url.into(),
            title: title.into(),
            price: price.into(),
            ..Default::default()
        }
    }

    #[test]
    fn dedup_prefers_url_then_title_price() {
        let rows = vec![
            raw("https://a/1", "A", "KSh 1"),
            raw("https://a/1", "A again", "KSh 2"),
            raw("", "B", "KSh 3"),
            raw("", "B", "KSh 3"),
            raw("", "", ""),
            raw("https://a/2", "B", "KSh 3"),
        ];
        let out = dedup(rows);
        let titles: Vec<&str> = out.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "B"]);
    }

    fn quiet_scraper() -> ListingScraper {
        let cfg = Config {
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..Config::default()
        };
        ListingScraper::new(&cfg).unwrap()
    }

    fn unreachable_portal(_: Source, url: &str) -> Result<String, ScraperError> {
        Err(ScraperError::Network(format!("connection refused: {url}")))
    }

    #[test]
    fn crawl_reports_index_abandoned_after_failures() {
        let s = quiet_scraper();
        let mut calls = 0;
        let result = s.crawl_with(Source::Jiji, ListingType::Sale, &mut |source, url| {
            calls += 1;
            unreachable_portal(source, url)
        });

        assert!(!result.is_complete());
        assert!(result.rows.is_empty());
        assert_eq!(result.pages_fetched, 0);
        assert_eq!(calls, MAX_CONSECUTIVE_FAILURES * Source::Jiji.index_paths(ListingType::Sale).len());
        assert!(result.failures[0].contains("connection refused"));
    }

    #[test]
    fn failed_scrape_is_recorded_as_unsuccessful() {
        let db = setup_test_db("scrape_failed");
        let s = quiet_scraper();

        let rows = s
            .run_scrape_with(&db, &[Source::Jiji], &mut unreachable_portal)
            .unwrap();
        assert!(rows.is_empty());

        let runs = db.with_conn(|conn| get_recent_scrapes(conn, 1)).unwrap();
        assert!(!runs[0].success);
        assert_eq!(runs[0].pages_fetched, Some(0));
        let message = runs[0].error_message.as_deref().unwrap();
        assert!(message.contains("Jiji"), "{message}");
    }

    #[test]
    fn clean_scrape_is_recorded_as_successful() {
        let db = setup_test_db("scrape_empty");
        let s = quiet_scraper();

        s.run_scrape_with(&db, &[Source::Jiji], &mut |_, _| Ok("<html><body></body></html>".to_string()))
            .unwrap();

        let runs = db.with_conn(|conn| get_recent_scrapes(conn, 1)).unwrap();
        assert!(runs[0].success);
        assert_eq!(runs[0].error_message, None);
        assert!(runs[0].finished_at.is_some());
    }

    #[test]
    fn scraper_builds_from_default_config() {
        let cfg = Config::default();
        let s = ListingScraper::new(&cfg).unwrap();
        assert_eq!(s.max_pages, cfg.max_pages);
        assert!(s.delay_ms.0 <= s.delay_ms.1);
    }
}
