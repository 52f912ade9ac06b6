use thiserror::Error;

/// Why a single request produced no usable page.
///
/// None of these abort a run: callers log them and skip the page or URL.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("gave up after {attempts} attempts, last status {status}")]
    RetriesExhausted { attempts: u32, status: u16 },
}

/// Failures reading or writing the files shared between stages.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("xlsx write error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("xlsx read error: {0}")]
    Workbook(#[from] calamine::XlsxError),
}
