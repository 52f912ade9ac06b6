use std::fs;
use std::path::PathBuf;
use log::info;
use crate::config::ScrapeConfig;
use crate::detail::{DetailProfile, DetailScraper};
use crate::error::StoreError;
use crate::exporter;
use crate::http::Fetcher;
use crate::paginator::{ListingSource, Paginator, ResumePoint};
use crate::postprocess::{needs_postprocessing, PostProcessor};
use crate::resume_manager::{Stage, StageManifest};
use crate::splitter::DescriptionSplitter;
use crate::table::RecordTable;

#[derive(Debug, Default, PartialEq)]
pub struct PipelineSummary {
    pub fresher_urls: usize,
    pub fresher_records: usize,
    pub it_urls: usize,
    pub it_records: usize,
    pub exported_rows: usize,
}

/// Runs every stage in order, reusing any stage the manifest marks complete.
pub struct Pipeline<F: Fetcher> {
    config: ScrapeConfig,
    fetcher: F,
    manifest: StageManifest,
    splitter: DescriptionSplitter,
}

impl<F: Fetcher> Pipeline<F> {
    pub fn new(config: ScrapeConfig, fetcher: F) -> Result<Self, StoreError> {
        fs::create_dir_all(&config.output_dir)?;
        let manifest = StageManifest::load(&config.output_dir);
        Ok(Pipeline {
            config,
            fetcher,
            manifest,
            splitter: DescriptionSplitter::new(),
        })
    }

    pub fn run(&mut self) -> Result<PipelineSummary, StoreError> {
        for stage in Stage::ALL {
            if self.manifest.is_complete(stage) {
                info!("[MAIN] {:?} already complete ({})", stage, stage.output_file());
            }
        }

        let fresher_urls = self.listing(Stage::FresherListing, ListingSource::fresher(&self.config), self.config.fresher_pages)?;
        let details = self.details(Stage::FresherDetails, DetailProfile::Fresher, &fresher_urls, self.config.fresher_detail_limit)?;
        let fresher_records = details.len();
        let post = self.postprocess(details)?;
        let parsed = self.parse_descriptions(post)?;
        let fresher_final = self.fresher_final(parsed)?;

        let it_urls = self.listing(Stage::ItListing, ListingSource::it(&self.config), self.config.it_pages)?;
        let it = self.details(Stage::ItDetails, DetailProfile::It, &it_urls, self.config.it_detail_limit)?;
        let it_records = it.len();

        let exported_rows = self.export(fresher_final, it)?;

        info!("[MAIN] All done.");
        Ok(PipelineSummary {
            fresher_urls: fresher_urls.len(),
            fresher_records,
            it_urls: it_urls.len(),
            it_records,
            exported_rows,
        })
    }

    fn path(&self, stage: Stage) -> PathBuf {
        self.manifest.output_path(stage)
    }

    fn load_if_complete(&self, stage: Stage) -> Result<Option<RecordTable>, StoreError> {
        if !self.manifest.is_complete(stage) {
            return Ok(None);
        }
        let path = self.path(stage);
        info!("[MAIN] Found existing {:?}, loading it.", path);
        Ok(Some(RecordTable::read_csv(path)?))
    }

    fn finish(&mut self, stage: Stage, table: &RecordTable) -> Result<(), StoreError> {
        table.write_csv(self.path(stage))?;
        self.manifest.mark_complete(stage)?;
        info!("[MAIN] Saved {} rows to {:?}", table.len(), self.path(stage));
        Ok(())
    }

    fn listing(&mut self, stage: Stage, source: ListingSource, pages: u32) -> Result<Vec<String>, StoreError> {
        let column = source.column;
        if let Some(table) = self.load_if_complete(stage)? {
            return Ok(table.non_null_values(column));
        }

        let path = self.path(stage);
        let resume = match self.manifest.checkpoint(stage) {
            Some(last_page) => Some(ResumePoint {
                last_page,
                urls: RecordTable::read_csv(&path)?.non_null_values(column),
            }),
            None => None,
        };

        let paginator = Paginator::new(&self.fetcher, source, pages, self.config.checkpoint_every, path);
        let manifest = &mut self.manifest;
        let report = paginator.run(resume, |page| manifest.record_checkpoint(stage, page))?;
        info!(
            "[MAIN] {:?}: {} pages fetched, {} skipped, {} checkpoint writes",
            stage, report.pages_fetched, report.pages_skipped, report.checkpoint_writes
        );

        self.manifest.mark_complete(stage)?;
        Ok(report.urls)
    }

    fn details(
        &mut self,
        stage: Stage,
        profile: DetailProfile,
        urls: &[String],
        limit: Option<usize>,
    ) -> Result<RecordTable, StoreError> {
        if let Some(table) = self.load_if_complete(stage)? {
            return Ok(table);
        }
        let table = DetailScraper::new(&self.fetcher, profile, self.config.detail_delay).scrape(urls, limit);
        self.finish(stage, &table)?;
        Ok(table)
    }

    fn postprocess(&mut self, mut table: RecordTable) -> Result<RecordTable, StoreError> {
        let stage = Stage::FresherPostprocess;
        if let Some(done) = self.load_if_complete(stage)? {
            return Ok(done);
        }
        if needs_postprocessing(&table) {
            PostProcessor::new(&self.fetcher, self.config.detail_delay).run(&mut table);
        } else {
            info!("[POSTPROCESS] Every record has a title and qualification; nothing to fetch.");
        }
        self.finish(stage, &table)?;
        Ok(table)
    }

    fn parse_descriptions(&mut self, mut table: RecordTable) -> Result<RecordTable, StoreError> {
        let stage = Stage::FresherParsed;
        if let Some(done) = self.load_if_complete(stage)? {
            return Ok(done);
        }
        info!("[EXTRACT] Parsing Job_Description for Skills and Description...");
        self.splitter.apply(&mut table);
        self.finish(stage, &table)?;
        Ok(table)
    }

    fn fresher_final(&mut self, mut table: RecordTable) -> Result<RecordTable, StoreError> {
        let stage = Stage::FresherFinal;
        if let Some(done) = self.load_if_complete(stage)? {
            return Ok(done);
        }
        table.drop_columns(exporter::FRESHER_DROPPED);
        self.finish(stage, &table)?;
        Ok(table)
    }

    fn export(&mut self, fresher: RecordTable, it: RecordTable) -> Result<usize, StoreError> {
        let stage = Stage::Export;
        let path = self.path(stage);
        if self.manifest.is_complete(stage) {
            let existing = exporter::read_workbook(&path)?;
            info!("[FINAL] Found existing {:?} with {} rows, leaving it as is.", path, existing.len());
            return Ok(existing.len());
        }

        let combined = exporter::merge(fresher, it);
        exporter::write_workbook(&combined, &path)?;
        self.manifest.mark_complete(stage)?;
        Ok(combined.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{listing_html, quiet_config, FakeSite};
    use std::collections::BTreeMap;
    use std::path::Path;
    use tempfile::TempDir;

    const FRESHER_HOST: &str = "https://m.fresher.test";
    const IT_HOST: &str = "https://www.it.test";

    fn config(dir: &Path) -> ScrapeConfig {
        ScrapeConfig {
            fresher_pages: 2,
            it_pages: 1,
            fresher_listing_url: format!("{}/list?sequence={{page}}", FRESHER_HOST),
            fresher_host: FRESHER_HOST.to_string(),
            it_search_url: format!("{}/search?q=1", IT_HOST),
            it_host: IT_HOST.to_string(),
            ..quiet_config(dir)
        }
    }

    fn fresher_detail(company: &str) -> String {
        format!(
            r#"<html><body>
                <h1>{company} Trainee</h1>
                <h2>{company}</h2>
                <div class="srp-exp">0 - 1 Yrs</div>
                <div class="srp-loc">Location: Pune</div>
                <div id="JobDescription">Job Responsibilities  Learn fast. Skills Excel,  Word</div>
                <span class="jd-cont-bx">Staffing</span>
            </body></html>"#
        )
    }

    fn site(config: &ScrapeConfig) -> FakeSite {
        let mut site = FakeSite::new();
        site.add(&format!("{}/list?sequence=1", FRESHER_HOST), &listing_html(&["/job/1", "/job/2"]));
        site.add(&format!("{}/list?sequence=2", FRESHER_HOST), &listing_html(&["/job/3"]));
        site.add(&format!("{}/job/1", FRESHER_HOST), &fresher_detail("Acme"));
        site.add(&format!("{}/job/2", FRESHER_HOST), &fresher_detail("Globex"));
        site.add_status(&format!("{}/job/3", FRESHER_HOST), 404);

        let it_list = ListingSource::it(config).page_url(1);
        site.add(
            &it_list,
            r#"<ul><li class="clearfix job-bx wht-shd-bx"><a class="posoverlay_srp" href="/it/9">x</a></li></ul>"#,
        );
        site.add(
            &format!("{}/it/9", IT_HOST),
            r#"<h1 class="jd-job-title">Rust Dev</h1><h2>Initech</h2>
               <li class="clearfix"><label>Industry</label><span class="basic-info-dtl">Software</span></li>
               <span class="jd-skill-tag"><a title="Rust Jobs">r</a></span>
               <div class="jd-desc">Ship it.</div>"#,
        );
        site
    }

    fn snapshot(dir: &Path) -> BTreeMap<String, Vec<u8>> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().path())
            .map(|p| (p.file_name().unwrap().to_string_lossy().to_string(), fs::read(&p).unwrap()))
            .collect()
    }

    #[test]
    fn test_full_run_produces_combined_export() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let site = site(&config);

        let summary = Pipeline::new(config, &site).unwrap().run().unwrap();

        assert_eq!(
            summary,
            PipelineSummary { fresher_urls: 3, fresher_records: 2, it_urls: 1, it_records: 1, exported_rows: 3 }
        );

        let export = exporter::read_workbook(dir.path().join(Stage::Export.output_file())).unwrap();
        let expected: Vec<String> = exporter::EXPORT_COLUMNS.iter().map(|c| c.to_string()).collect();
        assert_eq!(export.columns(), expected.as_slice());
        assert_eq!(export.get(0, "Company"), Some("Acme"));
        assert_eq!(export.get(0, "Job_Title"), Some("Acme Trainee"));
        assert_eq!(export.get(0, "Skills"), Some("Excel, Word"));
        assert_eq!(export.get(0, "Description"), Some("Learn fast."));
        assert_eq!(export.get(0, "Location"), Some("Pune"));
        assert_eq!(export.get(1, "Company"), Some("Globex"));
        assert_eq!(export.get(2, "Job_Title"), Some("Rust Dev"));
        assert_eq!(export.get(2, "Industry"), Some("Software"));
        assert_eq!(export.get(2, "Skills"), Some("Rust"));
        assert_eq!(export.get(2, "URL"), Some("https://www.it.test/it/9"));
        assert!(!export.has_column("Qualification"));

        for stage in Stage::ALL {
            assert!(dir.path().join(stage.output_file()).exists(), "{:?} missing", stage);
        }
    }

    #[test]
    fn test_second_run_is_offline_and_byte_identical() {
        let dir = TempDir::new().unwrap();
        let site = site(&config(dir.path()));

        let first = Pipeline::new(config(dir.path()), &site).unwrap().run().unwrap();
        let before = snapshot(dir.path());
        site.clear_requests();

        let second = Pipeline::new(config(dir.path()), &site).unwrap().run().unwrap();

        assert_eq!(site.request_count(), 0);
        assert_eq!(snapshot(dir.path()), before);
        assert_eq!(first.exported_rows, second.exported_rows);
    }

    #[test]
    fn test_deleted_output_is_redone() {
        let dir = TempDir::new().unwrap();
        let site = site(&config(dir.path()));
        Pipeline::new(config(dir.path()), &site).unwrap().run().unwrap();

        fs::remove_file(dir.path().join(Stage::ItDetails.output_file())).unwrap();
        site.clear_requests();
        Pipeline::new(config(dir.path()), &site).unwrap().run().unwrap();

        assert_eq!(site.requested(), vec![format!("{}/it/9", IT_HOST)]);
        let export = exporter::read_workbook(dir.path().join(Stage::Export.output_file())).unwrap();
        assert_eq!(export.len(), 3);
    }

    #[test]
    fn test_interrupted_listing_resumes_after_checkpoint() {
        let dir = TempDir::new().unwrap();
        let site = site(&config(dir.path()));

        let checkpoint = RecordTable::from_column(
            "Job_URL",
            &[format!("{}/job/1", FRESHER_HOST), format!("{}/job/2", FRESHER_HOST)],
        );
        checkpoint.write_csv(dir.path().join(Stage::FresherListing.output_file())).unwrap();
        let mut manifest = StageManifest::load(dir.path());
        manifest.record_checkpoint(Stage::FresherListing, 1).unwrap();

        let summary = Pipeline::new(config(dir.path()), &site).unwrap().run().unwrap();

        let first_page = format!("{}/list?sequence=1", FRESHER_HOST);
        assert!(!site.requested().contains(&first_page));
        assert!(site.requested().contains(&format!("{}/list?sequence=2", FRESHER_HOST)));
        assert_eq!(summary.fresher_urls, 3);
    }

    #[test]
    fn test_complete_records_skip_postprocessing_fetches() {
        let dir = TempDir::new().unwrap();
        let config = config(dir.path());
        let site = FakeSite::new();

        let mut details = RecordTable::new(&["URL", "Job_Title", "Qualification", "Job_Description"]);
        details.push_row(vec![Some("u1".into()), Some("Clerk".into()), Some("BA".into()), None]);

        let mut pipeline = Pipeline::new(config, &site).unwrap();
        let post = pipeline.postprocess(details.clone()).unwrap();

        assert_eq!(site.request_count(), 0);
        assert_eq!(post, details);
    }
}
