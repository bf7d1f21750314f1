use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

const DEFAULT_CONFIG_FILE: &str = "nairobi_listings.toml";
const ENV_PREFIX: &str = "NL_";

/// Application configuration managed by Figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub db_path: String,
    pub listen_addr: String,
    pub max_workers: usize,
    pub log_level: String,

    /// Pages per index before a crawl gives up.
    pub max_pages: usize,
    pub delay_min_ms: u64,
    pub delay_max_ms: u64,
    pub request_timeout_secs: u64,
    pub proxy: Option<String>,

    pub raw_csv: PathBuf,
    pub prepared_csv: PathBuf,
    pub cleaned_csv: PathBuf,
    pub location_stats_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub export_xlsx: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "nairobi_listings.sqlite".into(),
            listen_addr: "127.0.0.1:3000".into(),
            max_workers: 8,
            log_level: "info".into(),
            max_pages: 50,
            delay_min_ms: 1500,
            delay_max_ms: 3500,
            request_timeout_secs: 30,
            proxy: None,
            raw_csv: "nairobi_properties.csv".into(),
            prepared_csv: "nairobi_properties_full.csv".into(),
            cleaned_csv: "cleaned_properties.csv".into(),
            location_stats_csv: "location_summary.csv".into(),
            summary_csv: "location_summary_clean.csv".into(),
            export_xlsx: "nairobi_listings.xlsx".into(),
        }
    }
}

impl Config {
    /// Defaults, then `nairobi_listings.toml` if present, then `NL_*` env vars.
    pub fn figment() -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if PathBuf::from(DEFAULT_CONFIG_FILE).is_file() {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_use_pipeline_file_names() {
        let cfg = Config::default();
        assert_eq!(cfg.prepared_csv, PathBuf::from("nairobi_properties_full.csv"));
        assert_eq!(cfg.cleaned_csv, PathBuf::from("cleaned_properties.csv"));
        assert!(cfg.delay_min_ms <= cfg.delay_max_ms);
    }

    #[test]
    fn env_overrides_defaults() {
        figment::Jail::expect_with(|jail| {
            jail.set_env("NL_MAX_PAGES", "3");
            jail.set_env("NL_DB_PATH", "other.sqlite");
            let cfg = Config::load()?;
            assert_eq!(cfg.max_pages, 3);
            assert_eq!(cfg.db_path, "other.sqlite");
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_merged() {
        figment::Jail::expect_with(|jail| {
            jail.create_file(DEFAULT_CONFIG_FILE, "listen_addr = \"0.0.0.0:8080\"\nmax_workers = 2")?;
            let cfg = Config::load()?;
            assert_eq!(cfg.listen_addr, "0.0.0.0:8080");
            assert_eq!(cfg.max_workers, 2);
            assert_eq!(cfg.log_level, "info");
            Ok(())
        });
    }
}
