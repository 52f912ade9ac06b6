use std::time::Duration;
use std::thread;
use rand::Rng;
use serde::{Deserialize, Serialize};
use log::info;

/// Inclusive range, in seconds, for the jitter sleep after a request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl DelayRange {
    pub const NONE: DelayRange = DelayRange { min_secs: 0.0, max_secs: 0.0 };

    pub fn new(min_secs: f64, max_secs: f64) -> Self {
        DelayRange { min_secs, max_secs }
    }

    pub fn sample(&self) -> Duration {
        if self.max_secs <= 0.0 || self.max_secs < self.min_secs {
            return Duration::ZERO;
        }
        let mut rng = rand::thread_rng();
        let secs = rng.gen_range(self.min_secs.max(0.0)..=self.max_secs);
        Duration::from_secs_f64(secs)
    }
}

pub fn random_delay(range: DelayRange, label: &str) {
    let delay = range.sample();
    if delay.is_zero() {
        return;
    }
    info!("Waiting for {:.2} seconds ({})...", delay.as_secs_f64(), label);
    thread::sleep(delay);
}
