use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT, ACCEPT_LANGUAGE};
use serde::{Deserialize, Serialize};
use std::thread;
use std::time::Duration;
use log::warn;
use crate::config::ScrapeConfig;
use crate::error::FetchError;

/// Raw response: status code and body text.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub status: u16,
    pub body: String,
}

impl Page {
    pub fn ok(body: impl Into<String>) -> Self {
        Page { status: 200, body: body.into() }
    }
}

/// Anything that can GET a URL with a given User-Agent.
pub trait Fetcher {
    fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for &T {
    fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError> {
        (**self).get(url, user_agent)
    }
}

/// Fetches `url` and returns its body, treating any status other than 200 as a failure.
pub fn fetch_html(fetcher: &dyn Fetcher, url: &str, user_agent: &str) -> Result<String, FetchError> {
    let page = fetcher.get(url, user_agent)?;
    if page.status != 200 {
        return Err(FetchError::Status(page.status));
    }
    Ok(page.body)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_factor: f64,
    pub status_forcelist: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            backoff_factor: 0.5,
            status_forcelist: vec![429, 500, 502, 503, 504],
        }
    }
}

impl RetryPolicy {
    pub fn is_retryable(&self, status: u16) -> bool {
        self.status_forcelist.contains(&status)
    }

    /// Wait before the `retry`-th retry (zero based): factor, 2x factor, 4x factor...
    pub fn backoff(&self, retry: u32) -> Duration {
        let secs = self.backoff_factor * 2f64.powi(retry as i32);
        if secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(secs)
    }

    /// Runs `send` until it yields a non-retryable response or the retries are spent.
    pub fn execute<F>(&self, url: &str, mut send: F) -> Result<Page, FetchError>
    where
        F: FnMut() -> Result<Page, FetchError>,
    {
        let mut retry = 0;
        loop {
            match send() {
                Ok(page) if self.is_retryable(page.status) => {
                    if retry >= self.max_retries {
                        return Err(FetchError::RetriesExhausted {
                            attempts: retry + 1,
                            status: page.status,
                        });
                    }
                    warn!("Status {} from {}, retry {}/{}", page.status, url, retry + 1, self.max_retries);
                }
                Ok(page) => return Ok(page),
                Err(e) => {
                    if retry >= self.max_retries {
                        return Err(e);
                    }
                    warn!("{} for {}, retry {}/{}", e, url, retry + 1, self.max_retries);
                }
            }

            let wait = self.backoff(retry);
            if !wait.is_zero() {
                thread::sleep(wait);
            }
            retry += 1;
        }
    }
}

/// Blocking HTTP client with the retry policy applied to every GET.
pub struct HttpClient {
    client: Client,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(config: &ScrapeConfig) -> Result<Self, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        // Certificate validation is off; the site is known to serve broken chains.
        let client = Client::builder()
            .timeout(config.request_timeout())
            .default_headers(headers)
            .cookie_store(true)
            .danger_accept_invalid_certs(true)
            .build()?;

        Ok(HttpClient {
            client,
            retry: config.retry.clone(),
        })
    }

    fn send_once(&self, url: &str, user_agent: &str) -> Result<Page, FetchError> {
        let resp = self.client.get(url)
            .header(USER_AGENT, user_agent)
            .send()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = resp.status().as_u16();
        let body = resp.text().map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(Page { status, body })
    }
}

impl Fetcher for HttpClient {
    fn get(&self, url: &str, user_agent: &str) -> Result<Page, FetchError> {
        self.retry.execute(url, || self.send_once(url, user_agent))
    }
}
