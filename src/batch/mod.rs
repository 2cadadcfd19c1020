//! # Batch Orchestrator
//!
//! Renders one ad per CSV row and packs the results into a single zip.
//!
//! ## Flow
//!
//! ```text
//! rows ──► for each row, strictly in order:
//!            1. fetch + preprocess the row image (failure → no image)
//!            2. overwrite the working composer's content
//!            3. render, wait for the frame, capture it
//!            4. encode to the chosen format
//!            5. append {prefix}_{name}_{index}.{ext} to the archive
//!      ──► {prefix}_batch_{YYYY-MM-DD}.zip
//! ```
//!
//! Rows never render concurrently: the working composer is a single shared
//! surface, and the export gate is held for the whole run. Any row failure
//! aborts the batch and no archive is produced.

mod archive;
mod csv;

pub use archive::ArchiveBuilder;
pub use csv::{BatchProduct, CSV_HEADER, csv_template, parse_batch_csv};

use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AdForgeError, Result};
use crate::export::{ExportGate, export_as_image_file, sanitize_file_stem};
use crate::layout::AdComposer;
use crate::model::{Encoding, ExportSettings, TargetSize};
use crate::preprocess::{ImageFetcher, load_remote_image};

pub const MANIFEST_NAME: &str = "manifest.json";

/// A finished batch, ready to download.
#[derive(Debug, Clone)]
pub struct BatchArchive {
    pub filename: String,
    pub bytes: Vec<u8>,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Manifest<'a> {
    generated_at: String,
    format: String,
    target_size: &'a TargetSize,
    products: Vec<ManifestEntry<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ManifestEntry<'a> {
    file: &'a str,
    has_image: bool,
    #[serde(flatten)]
    product: &'a BatchProduct,
}

/// `{prefix}_{name}_{index}.{ext}` with a 1-based index.
pub fn entry_name(prefix: &str, product_name: &str, index: usize, ext: &str) -> String {
    format!(
        "{}_{}_{}.{}",
        sanitize_file_stem(prefix),
        sanitize_file_stem(product_name),
        index,
        ext
    )
}

/// `{prefix}_batch_{YYYY-MM-DD}.zip`
pub fn archive_filename(prefix: &str, date: NaiveDate) -> String {
    format!("{}_batch_{}.zip", sanitize_file_stem(prefix), date.format("%Y-%m-%d"))
}

pub struct BatchOrchestrator {
    fetcher: Arc<dyn ImageFetcher>,
    gate: ExportGate,
}

impl BatchOrchestrator {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, gate: ExportGate) -> Self {
        Self { fetcher, gate }
    }

    /// Run a batch against `composer`, a working copy of the editing session
    /// whose settings apply to every row.
    ///
    /// Returns `Ok(None)` when there are no rows.
    pub async fn run(
        &self,
        mut composer: AdComposer,
        rows: &[BatchProduct],
        export: &ExportSettings,
    ) -> Result<Option<BatchArchive>> {
        if rows.is_empty() {
            info!("batch has no rows; nothing to do");
            return Ok(None);
        }

        let encoding = export
            .encoding()
            .ok_or(AdForgeError::UnsupportedFormat(export.format))?;
        export.target_size.validate()?;
        let _guard = self.gate.try_begin()?;

        info!(rows = rows.len(), format = %export.format, "batch started");
        let mut archive = ArchiveBuilder::new();
        let mut images = Vec::with_capacity(rows.len());

        for (i, row) in rows.iter().enumerate() {
            let index = i + 1;
            let bytes = self
                .render_row(&mut composer, row, &export.target_size, encoding)
                .await
                .map_err(|e| {
                    warn!(row = index, name = %row.name, "batch aborted: {}", e);
                    AdForgeError::Batch {
                        row: index,
                        name: row.name.clone(),
                        source: Box::new(e),
                    }
                })?;
            images.push(composer.content().image.is_some());

            let name = entry_name(&export.filename, &row.name, index, encoding.extension());
            archive.add(&name, &bytes)?;
            info!(row = index, entry = %name, bytes = bytes.len(), "batch row exported");
        }

        if export.include_metadata {
            let manifest = Manifest {
                generated_at: chrono::Utc::now().to_rfc3339(),
                format: export.format.to_string(),
                target_size: &export.target_size,
                products: archive
                    .entries()
                    .iter()
                    .zip(rows)
                    .zip(&images)
                    .map(|((file, product), &has_image)| ManifestEntry {
                        file,
                        has_image,
                        product,
                    })
                    .collect(),
            };
            let json = serde_json::to_vec_pretty(&manifest)?;
            archive.add(MANIFEST_NAME, &json)?;
        }

        let (bytes, entries) = archive.finish()?;
        let filename = archive_filename(&export.filename, chrono::Local::now().date_naive());
        info!(filename = %filename, entries = entries.len(), bytes = bytes.len(), "batch complete");

        Ok(Some(BatchArchive {
            filename,
            bytes,
            entries,
        }))
    }

    async fn render_row(
        &self,
        composer: &mut AdComposer,
        row: &BatchProduct,
        target: &TargetSize,
        encoding: Encoding,
    ) -> Result<Vec<u8>> {
        let mut content = row.to_content();
        if let Some(url) = &row.image_url {
            content.image = load_remote_image(self.fetcher.as_ref(), url).await;
        }
        composer.set_content(content);

        let snapshot = composer.clone();
        let target = target.clone();
        let frame = tokio::task::spawn_blocking(move || snapshot.render_frame(&target))
            .await
            .map_err(|e| AdForgeError::Encode(format!("render task failed: {}", e)))??;

        // Accepted only if the working copy still matches what was painted
        let bitmap = composer.capture(frame)?;
        tokio::task::spawn_blocking(move || export_as_image_file(&bitmap, encoding))
            .await
            .map_err(|e| AdForgeError::Encode(format!("encode task failed: {}", e)))?
    }
}
