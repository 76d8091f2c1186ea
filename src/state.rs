use std::collections::BTreeSet;

use serde::Serialize;

use crate::domain::{DownloadIndex, DownloadRecord, FormLevel, ManifestSource, Paper};
use crate::manifest::SyncOutcome;
use crate::query;

pub const SYNC_FAILED_NOTICE: &str = "Failed to sync papers. Showing existing data.";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PapersState {
    pub papers: Vec<Paper>,
    pub source: ManifestSource,
    pub last_updated_at: String,
    pub downloads: DownloadIndex,
    pub active_downloads: BTreeSet<String>,
    pub notice: Option<String>,
}

impl Default for PapersState {
    fn default() -> Self {
        Self {
            papers: Vec::new(),
            source: ManifestSource::Seed,
            last_updated_at: String::new(),
            downloads: DownloadIndex::new(),
            active_downloads: BTreeSet::new(),
            notice: None,
        }
    }
}

impl PapersState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_sync(&mut self, outcome: SyncOutcome) {
        let remote_failed = outcome.remote_error.is_some();
        if remote_failed {
            self.notice = Some(SYNC_FAILED_NOTICE.to_string());
            if !self.papers.is_empty() {
                return;
            }
        } else {
            self.notice = None;
        }
        self.papers = outcome.manifest.papers;
        self.source = outcome.source;
        self.last_updated_at = outcome.manifest.updated_at;
    }

    pub fn set_downloads(&mut self, downloads: DownloadIndex) {
        self.downloads = downloads;
    }

    pub fn record_download(&mut self, record: DownloadRecord) {
        self.downloads.insert(record.paper_id.clone(), record);
    }

    pub fn forget_download(&mut self, paper_id: &str) {
        self.downloads.remove(paper_id);
    }

    pub fn mark_active(&mut self, paper_id: &str) {
        self.active_downloads.insert(paper_id.to_string());
    }

    pub fn clear_active(&mut self, paper_id: &str) {
        self.active_downloads.remove(paper_id);
    }

    pub fn is_downloading(&self, paper_id: &str) -> bool {
        self.active_downloads.contains(paper_id)
    }

    pub fn is_saved(&self, paper_id: &str) -> bool {
        self.downloads.contains_key(paper_id)
    }

    pub fn set_notice(&mut self, notice: impl Into<String>) {
        self.notice = Some(notice.into());
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn paper(&self, paper_id: &str) -> Option<&Paper> {
        query::find_paper(&self.papers, paper_id)
    }

    pub fn forms(&self) -> Vec<FormLevel> {
        query::list_forms(&self.papers)
    }

    pub fn subjects(&self, form: FormLevel) -> Vec<String> {
        query::list_subjects_by_form(&self.papers, form)
    }

    pub fn years(&self, form: FormLevel, subject: &str) -> Vec<i32> {
        query::list_years_by_form_subject(&self.papers, form, subject)
    }

    pub fn papers_for(&self, form: FormLevel, subject: &str, year: i32) -> Vec<&Paper> {
        query::list_papers_by_form_subject_year(&self.papers, form, subject, year)
    }

    pub fn search(&self, term: &str) -> Vec<&Paper> {
        query::search_papers_by_subject(&self.papers, term)
    }
}
