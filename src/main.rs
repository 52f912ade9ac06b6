use timesjobs_scraper_lib::{config, logger};
use timesjobs_scraper_lib::{HttpClient, Pipeline, ScrapeConfig};

use std::error::Error;
use log::info;

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    info!("Starting TimesJobs scraper...");

    let config = ScrapeConfig::load(config::CONFIG_FILE);
    info!(
        "Output in {:?}: {} fresher pages, {} IT pages",
        config.output_dir, config.fresher_pages, config.it_pages
    );

    let client = HttpClient::new(&config)?;
    let summary = Pipeline::new(config, client)?.run()?;

    info!(
        "Scraping Completed. {} fresher URLs -> {} records, {} IT URLs -> {} records, {} rows exported.",
        summary.fresher_urls, summary.fresher_records, summary.it_urls, summary.it_records, summary.exported_rows
    );
    Ok(())
}
