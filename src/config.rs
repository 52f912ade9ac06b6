use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use serde::{Deserialize, Serialize};
use log::{info, error};
use crate::delay_manager::DelayRange;
use crate::http::RetryPolicy;

pub const CONFIG_FILE: &str = "scraper_config.json";

pub const FRESHER_LISTING_URL: &str =
    "https://m.timesjobs.com/mobile/jobs-search-result.html?cboWorkExp1=0&sequence={page}";
pub const FRESHER_HOST: &str = "https://m.timesjobs.com";
pub const IT_SEARCH_URL: &str =
    "https://www.timesjobs.com/candidate/job-search.html?searchType=personalizedSearch&from=submit";
pub const IT_HOST: &str = "https://www.timesjobs.com";

// User agents, one per kind of request.
pub const LISTING_USER_AGENT: &str = "Mozilla/5.0";
pub const QUALIFICATION_USER_AGENT: &str = "Mozilla/5.0";
pub const BOT_USER_AGENT: &str = "Mozilla/5.0 (compatible; JobScraperBot/1.0)";
pub const FRESHER_DETAIL_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";
pub const IT_DETAIL_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Everything a run needs, passed explicitly into each stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapeConfig {
    pub output_dir: PathBuf,
    pub fresher_pages: u32,
    pub fresher_detail_limit: Option<usize>,
    pub it_pages: u32,
    pub it_detail_limit: Option<usize>,
    pub it_keywords: String,
    pub checkpoint_every: u32,
    pub request_timeout_secs: u64,
    pub fresher_listing_url: String,
    pub fresher_host: String,
    pub it_search_url: String,
    pub it_host: String,
    pub fresher_listing_delay: DelayRange,
    pub it_listing_delay: DelayRange,
    pub detail_delay: DelayRange,
    pub retry: RetryPolicy,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        ScrapeConfig {
            output_dir: PathBuf::from("."),
            fresher_pages: 500,
            fresher_detail_limit: Some(100),
            it_pages: 200,
            it_detail_limit: None,
            it_keywords: "software engineer".to_string(),
            checkpoint_every: 10,
            request_timeout_secs: 15,
            fresher_listing_url: FRESHER_LISTING_URL.to_string(),
            fresher_host: FRESHER_HOST.to_string(),
            it_search_url: IT_SEARCH_URL.to_string(),
            it_host: IT_HOST.to_string(),
            fresher_listing_delay: DelayRange::new(1.5, 3.5),
            it_listing_delay: DelayRange::new(2.0, 6.0),
            detail_delay: DelayRange::new(2.0, 5.0),
            retry: RetryPolicy::default(),
        }
    }
}

impl ScrapeConfig {
    /// Reads overrides from `path` if it exists. A missing or unreadable
    /// file falls back to the defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file at {:?}. Using defaults.", path);
            return ScrapeConfig::default();
        }
        let content = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read config file {:?}: {}. Using defaults.", path, e);
                return ScrapeConfig::default();
            }
        };
        match serde_json::from_str::<ScrapeConfig>(&content) {
            Ok(config) => {
                info!("Loaded config from {:?}", path);
                config
            }
            Err(e) => {
                error!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                ScrapeConfig::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Listing URL template for the IT search, `{page}` marking the page number.
    pub fn it_listing_url(&self) -> String {
        format!(
            "{}&txtKeywords={}&txtLocation=&sequence={{page}}",
            self.it_search_url,
            urlencoding::encode(&self.it_keywords)
        )
    }

    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}
