use std::time::{Duration, Instant};

use crate::domain::DownloadRecord;
use crate::downloads::{DownloadManager, PdfClient};
use crate::error::PapersError;
use crate::manifest::{ManifestClient, ManifestSynchronizer, SyncOutcome};
use crate::state::PapersState;
use crate::store::Store;

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<M: ManifestClient, P: PdfClient> {
    synchronizer: ManifestSynchronizer<M>,
    downloads: DownloadManager<P>,
}

impl<M: ManifestClient, P: PdfClient> App<M, P> {
    pub fn new(store: Store, manifest: M, pdf: P, manifest_url: Option<String>) -> Self {
        Self {
            synchronizer: ManifestSynchronizer::new(manifest, store.clone(), manifest_url),
            downloads: DownloadManager::new(pdf, store),
        }
    }

    pub fn synchronizer(&self) -> &ManifestSynchronizer<M> {
        &self.synchronizer
    }

    pub fn downloads(&self) -> &DownloadManager<P> {
        &self.downloads
    }

    pub fn refresh(&self, state: &mut PapersState, sink: &dyn ProgressSink) -> SyncOutcome {
        sink.event(ProgressEvent {
            message: match self.synchronizer.manifest_url() {
                Some(url) => format!("phase=Sync; requesting {url}"),
                None => "phase=Sync; no remote manifest configured".to_string(),
            },
            elapsed: None,
        });
        let start = Instant::now();
        let outcome = self.synchronizer.sync();
        sink.event(ProgressEvent {
            message: format!(
                "phase=Sync; source={} papers={}",
                outcome.source,
                outcome.manifest.papers.len()
            ),
            elapsed: Some(start.elapsed()),
        });
        state.apply_sync(outcome.clone());
        outcome
    }

    pub fn load_downloads(&self, state: &mut PapersState) -> Result<(), PapersError> {
        let index = self.downloads.reconcile()?;
        state.set_downloads(index);
        Ok(())
    }

    pub fn save_offline(
        &self,
        state: &mut PapersState,
        paper_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<DownloadRecord, PapersError> {
        let Some(paper) = state.paper(paper_id).cloned() else {
            let err = PapersError::PaperNotFound(paper_id.to_string());
            state.set_notice(format!("Download failed: {err}"));
            return Err(err);
        };

        sink.event(ProgressEvent {
            message: format!("phase=Download; {}", paper.pdf_url),
            elapsed: None,
        });
        state.mark_active(paper_id);
        let start = Instant::now();
        let result = self.downloads.save(&paper);
        state.clear_active(paper_id);

        match result {
            Ok(record) => {
                sink.event(ProgressEvent {
                    message: format!("phase=Store; saved {}", record.local_uri),
                    elapsed: Some(start.elapsed()),
                });
                state.record_download(record.clone());
                Ok(record)
            }
            Err(err) => {
                state.set_notice(format!("Download failed: {err}"));
                Err(err)
            }
        }
    }

    pub fn remove_offline(
        &self,
        state: &mut PapersState,
        paper_id: &str,
        sink: &dyn ProgressSink,
    ) -> Result<(), PapersError> {
        sink.event(ProgressEvent {
            message: format!("phase=Store; removing {paper_id}"),
            elapsed: None,
        });
        match self.downloads.remove(paper_id) {
            Ok(()) => {
                state.forget_download(paper_id);
                Ok(())
            }
            Err(err) => {
                state.set_notice(format!("Remove failed: {err}"));
                Err(err)
            }
        }
    }

    pub fn offline_record(
        &self,
        state: &mut PapersState,
        paper_id: &str,
    ) -> Result<Option<DownloadRecord>, PapersError> {
        let record = self.downloads.get(paper_id)?;
        match &record {
            Some(record) => state.record_download(record.clone()),
            None => state.forget_download(paper_id),
        }
        Ok(record)
    }
}
