//! Document ingestion
//!
//! A pass walks the source directory and fingerprints every file. Unchanged
//! files are skipped without any embedding call. Changed or new files are
//! extracted, chunked and embedded outside the memory lock, then committed
//! together with their fingerprint. A failure on one file is logged and recorded
//! in the report; the file stays unfingerprinted so the next pass retries it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use walkdir::{DirEntry, WalkDir};

use crate::chunking::chunk_words;
use crate::config::IndexConfig;
use crate::embedding::VectorEngine;
use crate::error::Result;
use crate::extract::{PlainTextExtractor, TextExtractor};
use crate::fingerprint::content_hash;
use crate::memory::VectorMemory;
use crate::record::{MemoryKind, MemoryRecord};

/// A file found in the source directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub path: PathBuf,
    /// Path relative to the source directory, `/`-separated
    pub name: String,
}

/// A document that could not be ingested this pass
#[derive(Debug, Clone)]
pub struct FailedDocument {
    pub name: String,
    pub error: String,
}

/// Outcome of one ingestion pass
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    /// Documents chunked, embedded and committed
    pub processed: usize,
    /// Documents whose fingerprint was current
    pub skipped: usize,
    pub failed: Vec<FailedDocument>,
    pub chunks_added: usize,
    /// Whether the artifacts were written
    pub persisted: bool,
}

/// Keeps a [`VectorMemory`] in sync with a folder of documents
pub struct DocumentIndexer {
    memory: Arc<VectorMemory>,
    extractor: Arc<dyn TextExtractor>,
    config: IndexConfig,
    pass: Mutex<()>,
}

impl DocumentIndexer {
    pub fn new(
        memory: Arc<VectorMemory>,
        extractor: Arc<dyn TextExtractor>,
        config: IndexConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            memory,
            extractor,
            config,
            pass: Mutex::new(()),
        })
    }

    /// Plain-text indexer over memory persisted in `config.storage_dir`
    pub fn open(engine: Arc<VectorEngine>, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        let memory = Arc::new(VectorMemory::open(engine, &config.storage_dir)?);
        Self::new(memory, Arc::new(PlainTextExtractor), config)
    }

    pub fn memory(&self) -> &Arc<VectorMemory> {
        &self.memory
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    /// Regular, non-hidden files under the source directory, sorted by name
    pub fn discover(&self) -> Result<Vec<SourceDocument>> {
        let root = &self.config.source_dir;
        if !root.is_dir() {
            log::debug!("Source directory {} does not exist", root.display());
            return Ok(Vec::new());
        }

        let max_depth = if self.config.recursive { usize::MAX } else { 1 };
        let storage = self.config.storage_dir.as_path();

        let mut documents: Vec<SourceDocument> = WalkDir::new(root)
            .min_depth(1)
            .max_depth(max_depth)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0 || (!is_hidden(entry) && entry.path() != storage)
            })
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    log::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| {
                let name = relative_name(root, entry.path())?;
                Some(SourceDocument {
                    path: entry.into_path(),
                    name,
                })
            })
            .collect();

        documents.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(documents)
    }

    /// Run one ingestion pass
    pub async fn ingest(&self) -> Result<IngestReport> {
        let _pass = self.pass.lock().await;

        let documents = self.discover()?;
        let known = self.memory.fingerprints();
        let mut report = IngestReport::default();

        for document in documents {
            let bytes = match tokio::fs::read(&document.path).await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Failed to read {}: {}", document.name, e);
                    report.failed.push(FailedDocument {
                        name: document.name,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            let hash = content_hash(&bytes);
            if known.is_current(&document.name, &hash) {
                log::debug!("Skipping unchanged file: {}", document.name);
                report.skipped += 1;
                continue;
            }

            log::info!("Processing: {}", document.name);
            match self.ingest_document(&document, &hash).await {
                Ok(added) => {
                    report.processed += 1;
                    report.chunks_added += added;
                }
                Err(e) if e.is_fatal() => {
                    log::error!("Aborting ingestion at {}: {}", document.name, e);
                    if report.processed > 0 {
                        self.memory.save()?;
                    }
                    return Err(e);
                }
                Err(e) => {
                    log::warn!("Failed to process {}: {}", document.name, e);
                    report.failed.push(FailedDocument {
                        name: document.name,
                        error: e.to_string(),
                    });
                }
            }
        }

        if report.processed > 0 {
            self.memory.save()?;
            report.persisted = true;
        } else {
            log::info!("No new documents or updates found");
        }

        log::info!(
            "Ingestion pass: {} processed, {} skipped, {} failed, {} chunks added",
            report.processed,
            report.skipped,
            report.failed.len(),
            report.chunks_added
        );
        Ok(report)
    }

    async fn ingest_document(&self, document: &SourceDocument, hash: &str) -> Result<usize> {
        let text = self.extractor.extract(&document.path)?;
        let chunks = chunk_words(&text, &self.config.chunking)?;
        let stem = document
            .path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.name.clone());

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let vectors = self.memory.engine().embed_batch(&texts).await?;

        let pairs = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| {
                let record = MemoryRecord::builder()
                    .text(chunk.text)
                    .kind(MemoryKind::DocumentChunk)
                    .source_name(document.name.as_str())
                    .chunk_id(format!("{}_{}", stem, chunk.index))
                    .build()?;
                Ok((record, vector))
            })
            .collect::<Result<Vec<_>>>()?;

        self.memory.commit_document(&document.name, hash, pairs)
    }

    /// True if any discovered file is new or changed since its last ingestion
    pub async fn is_stale(&self) -> Result<bool> {
        let known = self.memory.fingerprints();
        for document in self.discover()? {
            let current = match tokio::fs::read(&document.path).await {
                Ok(bytes) => known.is_current(&document.name, &content_hash(&bytes)),
                Err(_) => false,
            };
            if !current {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Ingest only when something changed; `None` if the index was current
    pub async fn refresh_if_stale(&self) -> Result<Option<IngestReport>> {
        if !self.is_stale().await? {
            return Ok(None);
        }
        self.ingest().await.map(Some)
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn relative_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}
