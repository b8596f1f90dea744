//! Schema loading with an on-disk cache.
//!
//! A remote schema is cached as two plain files: the document itself and the
//! `Last-Modified` value it was served with. A later run only downloads again
//! when the remote timestamp differs from the cached one.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::diagnostic::ModgenError;
use super::SchemaDocument;

/// The published schema location.
pub const DEFAULT_SCHEMA_URL: &str = "https://www.newgrounds.io/help/objects_and_components.json";

const DOCUMENT_FILE: &str = "objects_and_components.json";
const STAMP_FILE: &str = "last_updated";

/// Where the schema comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSource {
    Remote(String),
    Local(PathBuf),
}

impl SchemaSource {
    /// URLs are remote; anything else is a path relative to `base_dir`.
    pub fn parse(raw: &str, base_dir: &Path) -> Self {
        let raw = raw.trim();
        if raw.starts_with("http://") || raw.starts_with("https://") {
            SchemaSource::Remote(raw.to_string())
        } else {
            SchemaSource::Local(base_dir.join(raw))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            SchemaSource::Remote(url) => url.clone(),
            SchemaSource::Local(path) => path.display().to_string(),
        }
    }
}

/// A downloaded schema body and its response metadata.
#[derive(Debug, Clone, Default)]
pub struct FetchedSchema {
    pub body: String,
    pub last_modified: Option<String>,
    pub content_type: Option<String>,
}

/// Network access used by the loader.
pub trait Fetcher: Send + Sync {
    /// Reads the remote `Last-Modified` value without downloading the body.
    fn last_modified(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Option<String>, ModgenError>> + Send;

    /// Downloads the document.
    fn fetch(&self, url: &str) -> impl Future<Output = Result<FetchedSchema, ModgenError>> + Send;
}

/// [`Fetcher`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, ModgenError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("modgen/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| ModgenError::SchemaFetch {
                url: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

fn fetch_error(url: &str, message: impl ToString) -> ModgenError {
    ModgenError::SchemaFetch {
        url: url.to_string(),
        message: message.to_string(),
    }
}

fn header(response: &reqwest::Response, name: reqwest::header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

impl Fetcher for HttpFetcher {
    async fn last_modified(&self, url: &str) -> Result<Option<String>, ModgenError> {
        let response = self
            .client
            .head(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        if !response.status().is_success() {
            return Err(fetch_error(url, format!("HTTP {}", response.status())));
        }

        Ok(header(&response, reqwest::header::LAST_MODIFIED))
    }

    async fn fetch(&self, url: &str) -> Result<FetchedSchema, ModgenError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(url, format!("HTTP {}", status)));
        }

        let last_modified = header(&response, reqwest::header::LAST_MODIFIED);
        let content_type = header(&response, reqwest::header::CONTENT_TYPE);
        let body = response.text().await.map_err(|e| fetch_error(url, e))?;

        Ok(FetchedSchema {
            body,
            last_modified,
            content_type,
        })
    }
}

/// A schema read back from the cache.
#[derive(Debug, Clone)]
pub struct CachedSchema {
    pub document: SchemaDocument,
    pub stamp: Option<String>,
}

/// The cache directory holding the document and its timestamp.
#[derive(Debug, Clone)]
pub struct SchemaCache {
    dir: PathBuf,
}

impl SchemaCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn document_path(&self) -> PathBuf {
        self.dir.join(DOCUMENT_FILE)
    }

    pub fn stamp_path(&self) -> PathBuf {
        self.dir.join(STAMP_FILE)
    }

    pub fn stamp(&self) -> Result<Option<String>, ModgenError> {
        let path = self.stamp_path();
        if !path.exists() {
            return Ok(None);
        }
        let stamp = std::fs::read_to_string(&path).map_err(|e| ModgenError::io(&path, e))?;
        let stamp = stamp.trim();
        Ok((!stamp.is_empty()).then(|| stamp.to_string()))
    }

    /// Reads the cached document. A cache that no longer parses counts as empty.
    pub fn read(&self) -> Result<Option<CachedSchema>, ModgenError> {
        let path = self.document_path();
        if !path.exists() {
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path).map_err(|e| ModgenError::io(&path, e))?;
        let document = match SchemaDocument::from_json(&text, &path.display().to_string()) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable schema cache");
                return Ok(None);
            }
        };

        Ok(Some(CachedSchema {
            document,
            stamp: self.stamp()?,
        }))
    }

    /// Replaces the cached document and timestamp.
    pub fn store(&self, body: &str, stamp: Option<&str>) -> Result<(), ModgenError> {
        std::fs::create_dir_all(&self.dir).map_err(|e| ModgenError::io(&self.dir, e))?;

        write_atomic(&self.document_path(), body)?;

        let stamp_path = self.stamp_path();
        match stamp {
            Some(stamp) => write_atomic(&stamp_path, stamp)?,
            None if stamp_path.exists() => {
                std::fs::remove_file(&stamp_path).map_err(|e| ModgenError::io(&stamp_path, e))?
            }
            None => {}
        }

        Ok(())
    }
}

fn write_atomic(path: &Path, contents: &str) -> Result<(), ModgenError> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!("{}.tmp", file_name));

    std::fs::write(&tmp, contents).map_err(|e| ModgenError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| ModgenError::io(path, e))
}

/// How a loaded schema was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOrigin {
    Local,
    Downloaded,
    /// Cache matched the remote timestamp.
    Cache,
    /// A refresh was needed but failed; the cache was used instead.
    StaleCache,
}

/// A schema plus how it was obtained.
#[derive(Debug, Clone)]
pub struct LoadedSchema {
    pub document: SchemaDocument,
    pub origin: SchemaOrigin,
}

/// Cache state for `modgen status`.
#[derive(Debug, Clone)]
pub struct CacheStatus {
    pub source: String,
    pub cache_path: Option<PathBuf>,
    pub cached: bool,
    pub stamp: Option<String>,
}

/// Loads the schema document, keeping the cache current.
pub struct SchemaLoader<F = HttpFetcher> {
    source: SchemaSource,
    cache: SchemaCache,
    fetcher: F,
}

impl SchemaLoader<HttpFetcher> {
    pub fn new(source: SchemaSource, cache_dir: impl Into<PathBuf>) -> Result<Self, ModgenError> {
        Ok(Self::with_fetcher(source, cache_dir, HttpFetcher::new()?))
    }
}

impl<F: Fetcher> SchemaLoader<F> {
    pub fn with_fetcher(source: SchemaSource, cache_dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            source,
            cache: SchemaCache::new(cache_dir),
            fetcher,
        }
    }

    pub fn source(&self) -> &SchemaSource {
        &self.source
    }

    pub fn cache(&self) -> &SchemaCache {
        &self.cache
    }

    /// Returns the current schema, downloading it when the cache is missing or stale.
    pub async fn load(&self) -> Result<SchemaDocument, ModgenError> {
        Ok(self.load_with(false).await?.document)
    }

    /// Like [`load`](Self::load), but `force` skips the timestamp comparison.
    pub async fn refresh(&self, force: bool) -> Result<LoadedSchema, ModgenError> {
        self.load_with(force).await
    }

    /// Compares the remote timestamp against `cached`.
    ///
    /// Only a present remote timestamp that differs counts as stale. A failed
    /// lookup is reported and treated as "not stale".
    pub async fn is_stale(&self, cached: Option<&str>) -> bool {
        let SchemaSource::Remote(url) = &self.source else {
            return false;
        };

        match self.fetcher.last_modified(url).await {
            Ok(Some(remote)) => cached != Some(remote.as_str()),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(error = %e, "could not check schema timestamp, using cached copy");
                false
            }
        }
    }

    /// Reads the schema without any network access.
    pub fn load_cached(&self) -> Result<SchemaDocument, ModgenError> {
        match &self.source {
            SchemaSource::Local(path) => read_local(path),
            SchemaSource::Remote(_) => self
                .cache
                .read()?
                .map(|cached| cached.document)
                .ok_or_else(|| ModgenError::NoSchema {
                    message: format!("nothing cached at {}", self.cache.document_path().display()),
                }),
        }
    }

    pub fn status(&self) -> Result<CacheStatus, ModgenError> {
        Ok(match &self.source {
            SchemaSource::Local(path) => CacheStatus {
                source: self.source.describe(),
                cache_path: None,
                cached: path.exists(),
                stamp: None,
            },
            SchemaSource::Remote(_) => CacheStatus {
                source: self.source.describe(),
                cache_path: Some(self.cache.document_path()),
                cached: self.cache.document_path().exists(),
                stamp: self.cache.stamp()?,
            },
        })
    }

    async fn load_with(&self, force: bool) -> Result<LoadedSchema, ModgenError> {
        let url = match &self.source {
            SchemaSource::Local(path) => {
                return Ok(LoadedSchema {
                    document: read_local(path)?,
                    origin: SchemaOrigin::Local,
                })
            }
            SchemaSource::Remote(url) => url,
        };

        let Some(cached) = self.cache.read()? else {
            let document = self.download(url).await.map_err(|e| ModgenError::NoSchema {
                message: e.to_string(),
            })?;
            return Ok(LoadedSchema {
                document,
                origin: SchemaOrigin::Downloaded,
            });
        };

        if !force && !self.is_stale(cached.stamp.as_deref()).await {
            tracing::debug!("schema cache is current");
            return Ok(LoadedSchema {
                document: cached.document,
                origin: SchemaOrigin::Cache,
            });
        }

        match self.download(url).await {
            Ok(document) => Ok(LoadedSchema {
                document,
                origin: SchemaOrigin::Downloaded,
            }),
            Err(e) => {
                tracing::warn!(error = %e, "schema refresh failed, falling back to cached copy");
                Ok(LoadedSchema {
                    document: cached.document,
                    origin: SchemaOrigin::StaleCache,
                })
            }
        }
    }

    /// Downloads and validates the document, then replaces the cache.
    async fn download(&self, url: &str) -> Result<SchemaDocument, ModgenError> {
        tracing::info!(url, "downloading schema");
        let fetched = self.fetcher.fetch(url).await?;

        let is_json = fetched
            .content_type
            .as_deref()
            .map(|ct| ct.to_ascii_lowercase().contains("json"))
            .unwrap_or(false);
        if !is_json {
            return Err(fetch_error(
                url,
                format!(
                    "unexpected content type: {}",
                    fetched.content_type.as_deref().unwrap_or("<none>")
                ),
            ));
        }

        let document = SchemaDocument::from_json(&fetched.body, url)?;
        self.cache.store(&fetched.body, fetched.last_modified.as_deref())?;
        Ok(document)
    }
}

fn read_local(path: &Path) -> Result<SchemaDocument, ModgenError> {
    let text = std::fs::read_to_string(path).map_err(|e| ModgenError::io(path, e))?;
    SchemaDocument::from_json(&text, &path.display().to_string())
}
