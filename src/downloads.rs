use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::{DownloadIndex, DownloadRecord, Paper, sanitize_filename};
use crate::error::PapersError;
use crate::store::Store;

pub trait PdfClient: Send + Sync {
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, PapersError>;
}

#[derive(Clone)]
pub struct PdfHttpClient {
    client: Client,
}

impl PdfHttpClient {
    pub fn new() -> Result<Self, PapersError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("past-papers/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PapersError::DownloadHttp(err.to_string()))?,
        );
        // Transfers run to completion; only connecting is bounded.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(std::time::Duration::from_secs(30))
            .timeout(Option::<std::time::Duration>::None)
            .build()
            .map_err(|err| PapersError::DownloadHttp(err.to_string()))?;
        Ok(Self { client })
    }
}

impl PdfClient for PdfHttpClient {
    fn download(&self, url: &str, sink: &mut dyn Write) -> Result<u64, PapersError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PapersError::DownloadHttp(err.to_string()))?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "download request failed".to_string());
            return Err(PapersError::DownloadStatus { status, message });
        }
        io::copy(&mut response, sink).map_err(|err| PapersError::Filesystem(err.to_string()))
    }
}

pub struct DownloadManager<P: PdfClient> {
    client: P,
    store: Store,
    index_lock: Mutex<()>,
}

impl<P: PdfClient> DownloadManager<P> {
    pub fn new(client: P, store: Store) -> Self {
        Self {
            client,
            store,
            index_lock: Mutex::new(()),
        }
    }

    pub fn client(&self) -> &P {
        &self.client
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn target_path(&self, paper_id: &str) -> Utf8PathBuf {
        self.store
            .pdf_dir()
            .join(format!("{}.pdf", sanitize_filename(paper_id)))
    }

    pub fn index(&self) -> DownloadIndex {
        Store::read_json(&self.store.download_index_path()).unwrap_or_default()
    }

    pub fn save(&self, paper: &Paper) -> Result<DownloadRecord, PapersError> {
        self.store.ensure_layout()?;
        let pdf_dir = self.store.pdf_dir();
        let target = self.target_path(&paper.id);

        let mut temp = tempfile::Builder::new()
            .prefix("past-papers-download")
            .suffix(".part")
            .tempfile_in(pdf_dir.as_std_path())
            .map_err(|err| PapersError::Filesystem(err.to_string()))?;
        let written = self.client.download(&paper.pdf_url, temp.as_file_mut())?;
        temp.as_file_mut()
            .flush()
            .map_err(|err| PapersError::Filesystem(err.to_string()))?;
        Store::remove_file_if_exists(&target)?;
        temp.persist(target.as_std_path())
            .map_err(|err| PapersError::Filesystem(format!("persist {target}: {err}")))?;

        let record = DownloadRecord {
            paper_id: paper.id.clone(),
            local_uri: target.to_string(),
            downloaded_at: iso_timestamp(),
            size_bytes: Store::file_size(&target),
        };

        let _guard = self.lock_index();
        let mut index = self.index();
        index.insert(paper.id.clone(), record.clone());
        self.persist_index(&index)?;

        tracing::info!(paper_id = %paper.id, bytes = written, path = %target, "paper saved offline");
        Ok(record)
    }

    pub fn remove(&self, paper_id: &str) -> Result<(), PapersError> {
        let _guard = self.lock_index();
        let mut index = self.index();
        let Some(record) = index.remove(paper_id) else {
            return Ok(());
        };
        Store::remove_file_if_exists(Utf8Path::new(&record.local_uri))?;
        self.persist_index(&index)?;
        tracing::info!(paper_id, "offline copy removed");
        Ok(())
    }

    pub fn get(&self, paper_id: &str) -> Result<Option<DownloadRecord>, PapersError> {
        let _guard = self.lock_index();
        let mut index = self.index();
        let Some(record) = index.get(paper_id) else {
            return Ok(None);
        };
        if Store::exists(Utf8Path::new(&record.local_uri)) {
            return Ok(Some(record.clone()));
        }

        tracing::info!(paper_id, path = %record.local_uri, "pruning stale download record");
        index.remove(paper_id);
        self.persist_index(&index)?;
        Ok(None)
    }

    pub fn reconcile(&self) -> Result<DownloadIndex, PapersError> {
        let _guard = self.lock_index();
        let mut index = self.index();
        let before = index.len();
        index.retain(|_, record| Store::exists(Utf8Path::new(&record.local_uri)));
        if index.len() != before {
            tracing::info!(pruned = before - index.len(), "pruned stale download records");
            self.persist_index(&index)?;
        }
        Ok(index)
    }

    fn persist_index(&self, index: &DownloadIndex) -> Result<(), PapersError> {
        Store::write_json(&self.store.download_index_path(), index)
    }

    fn lock_index(&self) -> MutexGuard<'_, ()> {
        self.index_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
