use scraper::Html;
use log::{info, warn};
use crate::config::{BOT_USER_AGENT, QUALIFICATION_USER_AGENT};
use crate::delay_manager::{self, DelayRange};
use crate::extractor;
use crate::http::{fetch_html, Fetcher};
use crate::record::{JOB_TITLE, QUALIFICATION, URL};
use crate::table::RecordTable;

/// False only when every row already has both a title and a qualification.
pub fn needs_postprocessing(table: &RecordTable) -> bool {
    !(table.column_complete(JOB_TITLE) && table.column_complete(QUALIFICATION))
}

/// Second pass over scraped records: backfills Qualification and sets Job_Title.
pub struct PostProcessor<'a> {
    fetcher: &'a dyn Fetcher,
    delay: DelayRange,
}

impl<'a> PostProcessor<'a> {
    pub fn new(fetcher: &'a dyn Fetcher, delay: DelayRange) -> Self {
        PostProcessor { fetcher, delay }
    }

    pub fn run(&self, table: &mut RecordTable) {
        let filled = self.fill_missing_qualifications(table);
        info!("[POSTPROCESS] Filled {} missing Qualification entries", filled);
        self.add_job_titles(table);
    }

    /// Returns how many nulls were replaced with a value.
    pub fn fill_missing_qualifications(&self, table: &mut RecordTable) -> usize {
        info!("[POSTPROCESS] Filling missing Qualification entries...");
        table.add_column(QUALIFICATION);
        let mut filled = 0;

        for row in 0..table.len() {
            if table.get(row, QUALIFICATION).is_some() {
                continue;
            }
            let Some(url) = table.get(row, URL).map(str::to_string) else {
                continue;
            };

            let qualification = self.fetch_field(&url, QUALIFICATION_USER_AGENT, extractor::extract_qualification);
            if qualification.is_some() {
                filled += 1;
            }
            table.set(row, QUALIFICATION, qualification);
            delay_manager::random_delay(self.delay, "qualification");
        }
        filled
    }

    /// Re-fetches every row's page for its title, whether or not one is already known.
    pub fn add_job_titles(&self, table: &mut RecordTable) {
        info!("[POSTPROCESS] Extracting Job_Title for each URL...");
        let urls = table.column_values(URL);
        let total = urls.len();
        table.add_column(JOB_TITLE);

        for (row, url) in urls.into_iter().enumerate() {
            let title = match url {
                Some(url) => {
                    info!("  [{}/{}] fetching title for {}", row + 1, total, url);
                    let title = self.fetch_field(&url, BOT_USER_AGENT, extractor::extract_job_title);
                    delay_manager::random_delay(self.delay, "job title");
                    title
                }
                None => None,
            };
            table.set(row, JOB_TITLE, title);
        }
    }

    fn fetch_field(&self, url: &str, user_agent: &str, extract: fn(&Html) -> Option<String>) -> Option<String> {
        match fetch_html(self.fetcher, url, user_agent) {
            Ok(html) => extract(&Html::parse_document(&html)),
            Err(e) => {
                warn!("  Could not re-fetch {}: {}", url, e);
                None
            }
        }
    }
}
