pub mod config;
pub mod error;
pub mod http;
pub mod table;
pub mod record;
pub mod extractor;
pub mod splitter;
pub mod paginator;
pub mod detail;
pub mod postprocess;
pub mod exporter;
pub mod resume_manager;
pub mod delay_manager;
pub mod logger;
pub mod pipeline;

#[cfg(test)]
mod test_support;

// Exporting types for convenience
pub use config::ScrapeConfig;
pub use error::{FetchError, StoreError};
pub use http::{Fetcher, HttpClient, Page, RetryPolicy};
pub use table::RecordTable;
pub use pipeline::{Pipeline, PipelineSummary};
pub use resume_manager::{Stage, StageManifest};
