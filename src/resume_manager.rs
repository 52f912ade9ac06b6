use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use chrono::Local;
use serde::{Deserialize, Serialize};
use log::{info, error};
use crate::error::StoreError;
use crate::table::temp_path;

pub const MANIFEST_FILE: &str = "pipeline_manifest.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    FresherListing,
    FresherDetails,
    FresherPostprocess,
    FresherParsed,
    FresherFinal,
    ItListing,
    ItDetails,
    Export,
}

impl Stage {
    pub const ALL: [Stage; 8] = [
        Stage::FresherListing,
        Stage::FresherDetails,
        Stage::FresherPostprocess,
        Stage::FresherParsed,
        Stage::FresherFinal,
        Stage::ItListing,
        Stage::ItDetails,
        Stage::Export,
    ];

    pub fn output_file(&self) -> &'static str {
        match self {
            Stage::FresherListing => "timesjobs_job_urls.csv",
            Stage::FresherDetails => "timesjobs_job_details.csv",
            Stage::FresherPostprocess => "jobs_freshers.csv",
            Stage::FresherParsed => "jobs_freshers_parsed.csv",
            Stage::FresherFinal => "jobs_freshers_final.csv",
            Stage::ItListing => "timesjobs_ITjob_URL.csv",
            Stage::ItDetails => "timesjobs_ITjobs.csv",
            Stage::Export => "Timesjobs_data.xlsx",
        }
    }

    /// Stages built from this stage's output.
    pub fn downstream(&self) -> &'static [Stage] {
        match self {
            Stage::FresherListing => &[
                Stage::FresherDetails,
                Stage::FresherPostprocess,
                Stage::FresherParsed,
                Stage::FresherFinal,
                Stage::Export,
            ],
            Stage::FresherDetails => &[Stage::FresherPostprocess, Stage::FresherParsed, Stage::FresherFinal, Stage::Export],
            Stage::FresherPostprocess => &[Stage::FresherParsed, Stage::FresherFinal, Stage::Export],
            Stage::FresherParsed => &[Stage::FresherFinal, Stage::Export],
            Stage::FresherFinal => &[Stage::Export],
            Stage::ItListing => &[Stage::ItDetails, Stage::Export],
            Stage::ItDetails => &[Stage::Export],
            Stage::Export => &[],
        }
    }
}

/// Which stages of a run have finished, and how far the listing stages got.
///
/// A stage counts as done only if it is recorded here and its output file is
/// still present, so a half-written or deleted output is redone.
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct StageManifest {
    #[serde(default)]
    pub completed: BTreeMap<Stage, String>,
    #[serde(default)]
    pub checkpoints: BTreeMap<Stage, u32>,
    #[serde(skip)]
    path: PathBuf,
}

impl StageManifest {
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(MANIFEST_FILE);
        if !path.exists() {
            info!("No manifest at {:?}. Starting fresh.", path);
            return StageManifest { path, ..Default::default() };
        }

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                error!("Failed to read manifest {:?}: {}. Starting fresh.", path, e);
                return StageManifest { path, ..Default::default() };
            }
        };
        match serde_json::from_str::<StageManifest>(&content) {
            Ok(mut manifest) => {
                info!("Resumed previous run: {} stages complete.", manifest.completed.len());
                manifest.path = path;
                manifest
            }
            Err(e) => {
                error!("Failed to parse manifest: {}. Starting fresh.", e);
                StageManifest { path, ..Default::default() }
            }
        }
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        if !self.completed.contains_key(&stage) {
            return false;
        }
        let output = self.output_path(stage);
        if !output.exists() {
            info!("{:?} was recorded complete but {:?} is missing; redoing it.", stage, output);
            return false;
        }
        true
    }

    pub fn output_path(&self, stage: Stage) -> PathBuf {
        self.dir().join(stage.output_file())
    }

    fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Last checkpointed page of a listing stage, if its checkpoint file exists.
    pub fn checkpoint(&self, stage: Stage) -> Option<u32> {
        let page = *self.checkpoints.get(&stage)?;
        if self.output_path(stage).exists() { Some(page) } else { None }
    }

    pub fn record_checkpoint(&mut self, stage: Stage, page: u32) -> Result<(), StoreError> {
        self.checkpoints.insert(stage, page);
        self.save()
    }

    /// Records `stage` as done. Anything built from an earlier output of it is stale
    /// and stops counting as complete.
    pub fn mark_complete(&mut self, stage: Stage) -> Result<(), StoreError> {
        for later in stage.downstream() {
            self.completed.remove(later);
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        self.completed.insert(stage, timestamp);
        self.checkpoints.remove(&stage);
        self.save()
    }

    fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(self)?;
        let tmp = temp_path(&self.path);
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
