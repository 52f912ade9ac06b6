use scraper::Html;
use log::{info, warn};
use crate::config::{FRESHER_DETAIL_USER_AGENT, IT_DETAIL_USER_AGENT};
use crate::delay_manager::{self, DelayRange};
use crate::extractor;
use crate::http::{fetch_html, Fetcher};
use crate::record::{FresherRecord, ItRecord, JobRecord};
use crate::table::{RecordTable, Row};

/// Which kind of detail page is being scraped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailProfile {
    Fresher,
    It,
}

impl DetailProfile {
    pub fn tag(&self) -> &'static str {
        match self {
            DetailProfile::Fresher => "FRESHER DETAILS",
            DetailProfile::It => "IT DETAILS",
        }
    }

    pub fn user_agent(&self) -> &'static str {
        match self {
            DetailProfile::Fresher => FRESHER_DETAIL_USER_AGENT,
            DetailProfile::It => IT_DETAIL_USER_AGENT,
        }
    }

    pub fn empty_table(&self) -> RecordTable {
        match self {
            DetailProfile::Fresher => FresherRecord::empty_table(),
            DetailProfile::It => ItRecord::empty_table(),
        }
    }

    /// Extracts one row plus a label for the progress log.
    fn extract(&self, document: &Html, url: &str) -> (Row, Option<String>) {
        match self {
            DetailProfile::Fresher => labelled(extractor::extract_fresher(document, url)),
            DetailProfile::It => labelled(extractor::extract_it(document, url)),
        }
    }
}

fn labelled<R: JobRecord>(record: R) -> (Row, Option<String>) {
    let label = record.label().map(str::to_string);
    (record.into_row(), label)
}

/// Visits detail pages one at a time and builds a record table.
pub struct DetailScraper<'a> {
    fetcher: &'a dyn Fetcher,
    profile: DetailProfile,
    delay: DelayRange,
}

impl<'a> DetailScraper<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, profile: DetailProfile, delay: DelayRange) -> Self {
        DetailScraper { fetcher, profile, delay }
    }

    pub fn scrape(&self, urls: &[String], limit: Option<usize>) -> RecordTable {
        let take = limit.unwrap_or(urls.len()).min(urls.len());
        let urls = &urls[..take];
        let tag = self.profile.tag();
        let mut table = self.profile.empty_table();

        for (i, url) in urls.iter().enumerate() {
            info!("[{}] Scraping ({}/{}): {}", tag, i + 1, urls.len(), url);

            let html = match fetch_html(self.fetcher, url, self.profile.user_agent()) {
                Ok(html) => html,
                Err(e) => {
                    warn!("  Skipping {}: {}", url, e);
                    continue;
                }
            };

            let document = Html::parse_document(&html);
            let (row, label) = self.profile.extract(&document, url);
            table.push_row(row);
            info!("  Done: {}", label.as_deref().unwrap_or("N/A"));

            delay_manager::random_delay(self.delay, "detail page");
        }

        info!("[{}] Collected {} records from {} URLs", tag, table.len(), urls.len());
        table
    }
}
