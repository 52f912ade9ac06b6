use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use crate::config::ScrapeConfig;
use crate::delay_manager::DelayRange;
use crate::error::FetchError;
use crate::http::{Fetcher, Page, RetryPolicy};

/// In-memory site: serves canned pages and records every requested URL.
/// Unknown URLs answer 404.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, Page>,
    requests: RefCell<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        FakeSite::default()
    }

    pub fn add(&mut self, url: &str, body: &str) {
        self.pages.insert(url.to_string(), Page::ok(body));
    }

    pub fn add_status(&mut self, url: &str, status: u16) {
        self.pages.insert(url.to_string(), Page { status, body: String::new() });
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    pub fn clear_requests(&self) {
        self.requests.borrow_mut().clear();
    }
}

impl Fetcher for FakeSite {
    fn get(&self, url: &str, _user_agent: &str) -> Result<Page, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        Ok(self.pages.get(url).cloned().unwrap_or(Page { status: 404, body: String::new() }))
    }
}

/// A fresher-style result page with one card per href.
pub fn listing_html(hrefs: &[&str]) -> String {
    let cards: String = hrefs
        .iter()
        .map(|h| format!(r#"<div class="srp-listing"><a class="srp-apply-new" href="{}">Apply</a></div>"#, h))
        .collect();
    format!("<html><body>{}</body></html>", cards)
}

/// Defaults with every sleep removed, writing into `dir`.
pub fn quiet_config(dir: &Path) -> ScrapeConfig {
    ScrapeConfig {
        output_dir: dir.to_path_buf(),
        fresher_listing_delay: DelayRange::NONE,
        it_listing_delay: DelayRange::NONE,
        detail_delay: DelayRange::NONE,
        retry: RetryPolicy { backoff_factor: 0.0, ..RetryPolicy::default() },
        ..ScrapeConfig::default()
    }
}
