use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Serialize;
use serde_json::Value;

use crate::domain::{FormLevel, ManifestPayload, ManifestSource, Paper};
use crate::error::PapersError;
use crate::seed::seed_manifest;
use crate::store::Store;

pub const MANIFEST_TIMEOUT: Duration = Duration::from_secs(8);

const TIERS: [ManifestSource; 3] = [
    ManifestSource::Remote,
    ManifestSource::Cache,
    ManifestSource::Seed,
];

pub trait ManifestClient: Send + Sync {
    fn fetch_manifest(&self, url: &str) -> Result<Value, PapersError>;
}

#[derive(Clone)]
pub struct ManifestHttpClient {
    client: Client,
}

impl ManifestHttpClient {
    pub fn new() -> Result<Self, PapersError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("past-papers/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PapersError::ManifestHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(MANIFEST_TIMEOUT)
            .build()
            .map_err(|err| PapersError::ManifestHttp(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, PapersError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .status()
            .canonical_reason()
            .unwrap_or("manifest request failed")
            .to_string();
        Err(PapersError::ManifestStatus { status, message })
    }
}

impl ManifestClient for ManifestHttpClient {
    fn fetch_manifest(&self, url: &str) -> Result<Value, PapersError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| PapersError::ManifestHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response
            .json::<Value>()
            .map_err(|err| PapersError::ManifestParse(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutcome {
    pub manifest: ManifestPayload,
    pub source: ManifestSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_error: Option<String>,
}

pub struct ManifestSynchronizer<M: ManifestClient> {
    client: M,
    store: Store,
    manifest_url: Option<String>,
}

impl<M: ManifestClient> ManifestSynchronizer<M> {
    pub fn new(client: M, store: Store, manifest_url: Option<String>) -> Self {
        Self {
            client,
            store,
            manifest_url,
        }
    }

    pub fn client(&self) -> &M {
        &self.client
    }

    pub fn manifest_url(&self) -> Option<&str> {
        self.manifest_url.as_deref()
    }

    pub fn sync(&self) -> SyncOutcome {
        let mut remote_error = None;
        let (manifest, source) = TIERS
            .iter()
            .find_map(|&source| {
                self.provide(source, &mut remote_error)
                    .map(|manifest| (manifest, source))
            })
            .unwrap_or_else(|| (seed_manifest(), ManifestSource::Seed));

        tracing::info!(
            source = %source,
            papers = manifest.papers.len(),
            updated_at = %manifest.updated_at,
            "manifest synchronized"
        );
        SyncOutcome {
            manifest,
            source,
            remote_error,
        }
    }

    fn provide(
        &self,
        source: ManifestSource,
        remote_error: &mut Option<String>,
    ) -> Option<ManifestPayload> {
        match source {
            ManifestSource::Remote => match self.fetch_remote() {
                Ok(manifest) => manifest,
                Err(err) => {
                    tracing::warn!(error = %err, "remote manifest unavailable; falling back");
                    *remote_error = Some(err.to_string());
                    None
                }
            },
            ManifestSource::Cache => self.read_cache(),
            ManifestSource::Seed => Some(seed_manifest()),
        }
    }

    pub fn fetch_remote(&self) -> Result<Option<ManifestPayload>, PapersError> {
        let Some(url) = self.manifest_url.as_deref() else {
            return Ok(None);
        };
        let raw = self.client.fetch_manifest(url)?;
        let manifest = normalize_manifest(extract_manifest_candidate(&raw)).ok_or_else(|| {
            PapersError::ManifestParse("payload contains no valid papers".to_string())
        })?;

        let cache_path = self.store.manifest_cache_path();
        if let Err(err) = Store::write_json(&cache_path, &manifest) {
            tracing::warn!(path = %cache_path, error = %err, "failed to cache remote manifest");
        }
        Ok(Some(manifest))
    }

    pub fn read_cache(&self) -> Option<ManifestPayload> {
        let cache_path = self.store.manifest_cache_path();
        let raw = Store::read_json::<Value>(&cache_path)?;
        let manifest = normalize_manifest(&raw);
        if manifest.is_none() {
            tracing::debug!(path = %cache_path, "cached manifest is invalid");
        }
        manifest
    }
}

pub fn extract_manifest_candidate(value: &Value) -> &Value {
    match value.as_object() {
        Some(object) => object
            .get("manifest")
            .or_else(|| object.get("data"))
            .unwrap_or(value),
        None => value,
    }
}

pub fn normalize_manifest(value: &Value) -> Option<ManifestPayload> {
    let object = value.as_object()?;
    let updated_at = object.get("updatedAt")?.as_str()?;
    let entries = object.get("papers")?.as_array()?;

    let papers: Vec<Paper> = entries.iter().filter_map(normalize_paper).collect();
    if papers.is_empty() {
        return None;
    }

    Some(ManifestPayload {
        updated_at: updated_at.to_string(),
        papers,
    })
}

pub fn normalize_paper(value: &Value) -> Option<Paper> {
    let item = value.as_object()?;
    let text = |key: &str| item.get(key).and_then(Value::as_str).map(str::to_string);

    let form = item
        .get("form")
        .and_then(integral)
        .and_then(FormLevel::from_i64)?;
    let year = item
        .get("year")
        .and_then(integral)
        .and_then(|year| i32::try_from(year).ok())?;

    Some(Paper {
        id: text("id")?,
        form,
        subject: text("subject")?,
        year,
        title: text("title")?,
        pdf_url: text("pdfUrl")?,
        size_bytes: item
            .get("sizeBytes")
            .and_then(integral)
            .and_then(|size| u64::try_from(size).ok()),
        updated_at: text("updatedAt")?,
    })
}

// JSON numbers written as `2` or `2.0` carry the same integer.
pub(crate) fn integral(value: &Value) -> Option<i64> {
    if let Some(int) = value.as_i64() {
        return Some(int);
    }
    let float = value.as_f64()?;
    if float.fract() != 0.0 || float < i64::MIN as f64 || float >= i64::MAX as f64 {
        return None;
    }
    Some(float as i64)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn paper_json(id: &str) -> Value {
        json!({
            "id": id,
            "form": 2,
            "subject": "Biology",
            "year": 2024,
            "title": "Biology Form 2",
            "pdfUrl": format!("https://cdn.example/{id}.pdf"),
            "updatedAt": "2026-01-01T00:00:00Z"
        })
    }

    #[test]
    fn envelope_is_unwrapped() {
        let inner = json!({ "updatedAt": "x", "papers": [] });
        assert_eq!(
            extract_manifest_candidate(&json!({ "manifest": inner.clone() })),
            &inner
        );
        assert_eq!(
            extract_manifest_candidate(&json!({ "data": inner.clone() })),
            &inner
        );
        assert_eq!(extract_manifest_candidate(&inner), &inner);
    }

    #[test]
    fn invalid_entries_are_dropped_individually() {
        let mut wrong_form = paper_json("bad-form");
        wrong_form["form"] = json!(6);
        let mut text_year = paper_json("bad-year");
        text_year["year"] = json!("2024");
        let mut no_url = paper_json("no-url");
        no_url.as_object_mut().unwrap().remove("pdfUrl");

        let manifest = normalize_manifest(&json!({
            "updatedAt": "2026-01-02T00:00:00Z",
            "papers": [paper_json("good-1"), wrong_form, text_year, no_url, 42, paper_json("good-2")]
        }))
        .unwrap();

        let ids: Vec<_> = manifest.papers.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["good-1", "good-2"]);
    }

    #[test]
    fn size_bytes_of_wrong_type_is_ignored() {
        let mut paper = paper_json("sized");
        paper["sizeBytes"] = json!("large");
        assert_eq!(normalize_paper(&paper).unwrap().size_bytes, None);

        paper["sizeBytes"] = json!(2048);
        assert_eq!(normalize_paper(&paper).unwrap().size_bytes, Some(2048));
    }

    #[test]
    fn integral_floats_are_accepted() {
        let manifest = normalize_manifest(&json!({
            "updatedAt": "x",
            "papers": [{
                "id": "a",
                "form": 2.0,
                "subject": "Math",
                "year": 2024.0,
                "title": "t",
                "pdfUrl": "https://h/a.pdf",
                "sizeBytes": 512.0,
                "updatedAt": "x"
            }]
        }))
        .unwrap();
        let paper = &manifest.papers[0];
        assert_eq!(paper.form.get(), 2);
        assert_eq!(paper.year, 2024);
        assert_eq!(paper.size_bytes, Some(512));

        let mut fractional = paper_json("half");
        fractional["form"] = json!(2.5);
        assert!(normalize_paper(&fractional).is_none());

        let mut negative = paper_json("negative");
        negative["sizeBytes"] = json!(-1.0);
        assert_eq!(normalize_paper(&negative).unwrap().size_bytes, None);
    }

    #[test]
    fn payload_rejected_without_timestamp_or_papers() {
        assert!(normalize_manifest(&json!({ "papers": [paper_json("a")] })).is_none());
        assert!(normalize_manifest(&json!({ "updatedAt": 5, "papers": [paper_json("a")] })).is_none());
        assert!(normalize_manifest(&json!({ "updatedAt": "x", "papers": [] })).is_none());
        assert!(normalize_manifest(&json!({ "updatedAt": "x", "papers": {} })).is_none());
        assert!(normalize_manifest(&json!([paper_json("a")])).is_none());
    }
}
