use std::path::PathBuf;
use scraper::{Html, Selector};
use url::Url;
use log::{info, warn};
use crate::config::{ScrapeConfig, LISTING_USER_AGENT, BOT_USER_AGENT};
use crate::delay_manager::{self, DelayRange};
use crate::error::StoreError;
use crate::http::{fetch_html, Fetcher};
use crate::table::RecordTable;

/// One paginated search-result listing and how to read it.
#[derive(Debug, Clone)]
pub struct ListingSource {
    pub tag: &'static str,
    /// Page URL with `{page}` standing for the page number.
    pub url_template: String,
    pub host: String,
    pub container_css: &'static str,
    pub link_css: &'static str,
    /// Column name used in the checkpoint file.
    pub column: &'static str,
    pub user_agent: &'static str,
    pub delay: DelayRange,
}

impl ListingSource {
    pub fn fresher(config: &ScrapeConfig) -> Self {
        ListingSource {
            tag: "FRESHER LIST",
            url_template: config.fresher_listing_url.clone(),
            host: config.fresher_host.clone(),
            container_css: "div.srp-listing",
            link_css: "a.srp-apply-new",
            column: "Job_URL",
            user_agent: LISTING_USER_AGENT,
            delay: config.fresher_listing_delay,
        }
    }

    pub fn it(config: &ScrapeConfig) -> Self {
        ListingSource {
            tag: "IT LIST",
            url_template: config.it_listing_url(),
            host: config.it_host.clone(),
            container_css: "li.clearfix.job-bx.wht-shd-bx",
            link_css: "a.posoverlay_srp",
            column: "URL",
            user_agent: BOT_USER_AGENT,
            delay: config.it_listing_delay,
        }
    }

    pub fn page_url(&self, page: u32) -> String {
        self.url_template.replace("{page}", &page.to_string())
    }

    /// Detail links on one result page, in page order, made absolute.
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let (container, link) = match (Selector::parse(self.container_css), Selector::parse(self.link_css)) {
            (Ok(c), Ok(l)) => (c, l),
            _ => return vec![],
        };

        let mut links = Vec::new();
        for card in document.select(&container) {
            let href = card
                .select(&link)
                .filter_map(|a| a.value().attr("href"))
                .map(|h| h.replace("&amp;", "&").trim().to_string())
                .find(|h| !h.is_empty());
            if let Some(href) = href {
                links.push(self.absolutize(&href));
            }
        }
        links
    }

    fn absolutize(&self, href: &str) -> String {
        if Url::parse(href).is_ok() {
            return href.to_string();
        }
        match Url::parse(&self.host).and_then(|base| base.join(href)) {
            Ok(joined) => joined.to_string(),
            Err(_) => href.to_string(),
        }
    }
}

/// Where a listing scrape picks up.
#[derive(Debug, Clone, Default)]
pub struct ResumePoint {
    pub last_page: u32,
    pub urls: Vec<String>,
}

#[derive(Debug, Default)]
pub struct PaginationReport {
    pub urls: Vec<String>,
    pub pages_fetched: u32,
    pub pages_skipped: u32,
    pub checkpoint_writes: u32,
}

/// Walks result pages `1..=pages`, collecting detail URLs and checkpointing them.
pub struct Paginator<'a> {
    fetcher: &'a dyn Fetcher,
    source: ListingSource,
    pages: u32,
    checkpoint_every: u32,
    checkpoint_path: PathBuf,
}

impl<'a> Paginator<'a> {
    pub fn new(
        fetcher: &'a dyn Fetcher,
        source: ListingSource,
        pages: u32,
        checkpoint_every: u32,
        checkpoint_path: PathBuf,
    ) -> Self {
        Paginator { fetcher, source, pages, checkpoint_every, checkpoint_path }
    }

    /// `on_checkpoint` is called with the page number after every intermediate write.
    pub fn run<F>(&self, resume: Option<ResumePoint>, mut on_checkpoint: F) -> Result<PaginationReport, StoreError>
    where
        F: FnMut(u32) -> Result<(), StoreError>,
    {
        let resume = resume.unwrap_or_default();
        let mut report = PaginationReport { urls: resume.urls, ..Default::default() };
        if resume.last_page > 0 {
            info!("[{}] Resuming after page {} with {} URLs", self.source.tag, resume.last_page, report.urls.len());
        }

        for page in (resume.last_page + 1)..=self.pages {
            let url = self.source.page_url(page);
            info!("[{}] Scraping page {} -> {}", self.source.tag, page, url);

            match fetch_html(self.fetcher, &url, self.source.user_agent) {
                Ok(html) => {
                    let links = self.source.extract_links(&html);
                    info!("  Page {}: {} URLs found", page, links.len());
                    report.urls.extend(links);
                    report.pages_fetched += 1;
                }
                Err(e) => {
                    warn!("  Failed to fetch page {}: {}", page, e);
                    report.pages_skipped += 1;
                }
            }

            if self.checkpoint_every > 0 && page % self.checkpoint_every == 0 {
                self.write_checkpoint(&report.urls)?;
                report.checkpoint_writes += 1;
                on_checkpoint(page)?;
                info!("  Saved progress to {:?}", self.checkpoint_path);
            }

            delay_manager::random_delay(self.source.delay, "listing page");
        }

        self.write_checkpoint(&report.urls)?;
        report.checkpoint_writes += 1;
        info!("[{}] Total {} job URLs saved to {:?}", self.source.tag, report.urls.len(), self.checkpoint_path);
        Ok(report)
    }

    fn write_checkpoint(&self, urls: &[String]) -> Result<(), StoreError> {
        RecordTable::from_column(self.source.column, urls).write_csv(&self.checkpoint_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{listing_html, FakeSite};
    use tempfile::TempDir;

    fn source(site_host: &str) -> ListingSource {
        ListingSource {
            tag: "TEST LIST",
            url_template: format!("{}/list?sequence={{page}}", site_host),
            host: site_host.to_string(),
            container_css: "div.srp-listing",
            link_css: "a.srp-apply-new",
            column: "Job_URL",
            user_agent: LISTING_USER_AGENT,
            delay: DelayRange::NONE,
        }
    }

    #[test]
    fn test_extract_links_normalizes_relative_hrefs() {
        let src = source("https://m.timesjobs.com");
        let html = r#"
            <div class="srp-listing"><a class="srp-apply-new" href="/mobile/job-detail.html?jobid=1&amp;src=srp">Apply</a></div>
            <div class="srp-listing"><a class="other" href="/ignored">x</a></div>
            <div class="srp-listing"><a class="srp-apply-new" href=" https://m.timesjobs.com/job/2 ">Apply</a></div>
            <a class="srp-apply-new" href="/outside-container">x</a>
        "#;
        assert_eq!(
            src.extract_links(html),
            vec![
                "https://m.timesjobs.com/mobile/job-detail.html?jobid=1&src=srp".to_string(),
                "https://m.timesjobs.com/job/2".to_string(),
            ]
        );
    }

    #[test]
    fn test_it_source_reads_job_boxes() {
        let src = ListingSource::it(&ScrapeConfig::default());
        let html = r#"<ul>
            <li class="clearfix job-bx wht-shd-bx"><a class="posoverlay_srp" href="https://www.timesjobs.com/job-detail/a">A</a></li>
            <li class="clearfix job-bx wht-shd-bx"><a class="posoverlay_srp" href="/job-detail/b">B</a></li>
            <li class="clearfix"><a class="posoverlay_srp" href="/not-a-card">C</a></li>
        </ul>"#;
        assert_eq!(
            src.extract_links(html),
            vec![
                "https://www.timesjobs.com/job-detail/a".to_string(),
                "https://www.timesjobs.com/job-detail/b".to_string(),
            ]
        );
        assert!(src.page_url(7).ends_with("&sequence=7"));
    }

    #[test]
    fn test_checkpoint_cadence_over_23_pages() {
        let dir = TempDir::new().unwrap();
        let host = "https://site.test";
        let mut site = FakeSite::new();
        for page in 1..=23 {
            site.add(&format!("{}/list?sequence={}", host, page), &listing_html(&[&format!("/job/{}", page)]));
        }

        let mut checkpoints = Vec::new();
        let paginator = Paginator::new(&site, source(host), 23, 10, dir.path().join("urls.csv"));
        let report = paginator.run(None, |page| { checkpoints.push(page); Ok(()) }).unwrap();

        assert_eq!(checkpoints, vec![10, 20]);
        assert_eq!(report.checkpoint_writes, 3);
        assert_eq!(report.urls.len(), 23);

        let saved = RecordTable::read_csv(dir.path().join("urls.csv")).unwrap();
        assert_eq!(saved.non_null_values("Job_URL"), report.urls);
    }

    #[test]
    fn test_failed_pages_add_nothing_and_order_is_kept() {
        let dir = TempDir::new().unwrap();
        let host = "https://site.test";
        let mut site = FakeSite::new();
        site.add(&format!("{}/list?sequence=1", host), &listing_html(&["/a", "/b"]));
        site.add_status(&format!("{}/list?sequence=2", host), 500);
        site.add(&format!("{}/list?sequence=3", host), &listing_html(&["/c", "/a"]));

        let paginator = Paginator::new(&site, source(host), 3, 10, dir.path().join("urls.csv"));
        let report = paginator.run(None, |_| Ok(())).unwrap();

        assert_eq!(
            report.urls,
            vec![
                format!("{}/a", host),
                format!("{}/b", host),
                format!("{}/c", host),
                format!("{}/a", host),
            ]
        );
        assert_eq!(report.pages_fetched, 2);
        assert_eq!(report.pages_skipped, 1);
        assert_eq!(report.checkpoint_writes, 1);
    }

    #[test]
    fn test_resume_starts_after_last_checkpoint() {
        let dir = TempDir::new().unwrap();
        let host = "https://site.test";
        let mut site = FakeSite::new();
        for page in 1..=12 {
            site.add(&format!("{}/list?sequence={}", host, page), &listing_html(&[&format!("/job/{}", page)]));
        }

        let resume = ResumePoint { last_page: 10, urls: vec!["earlier".to_string()] };
        let paginator = Paginator::new(&site, source(host), 12, 10, dir.path().join("urls.csv"));
        let report = paginator.run(Some(resume), |_| Ok(())).unwrap();

        assert_eq!(
            site.requested(),
            vec![format!("{}/list?sequence=11", host), format!("{}/list?sequence=12", host)]
        );
        assert_eq!(report.urls[0], "earlier");
        assert_eq!(report.urls.len(), 3);
    }
}
