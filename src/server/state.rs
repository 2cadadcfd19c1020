//! Server state and configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::Result;
use crate::export::ExportGate;
use crate::layout::{AdComposer, TextFont};
use crate::model::{ProductContent, TemplateSettings};
use crate::preprocess::{HttpImageFetcher, ImageFetcher};
use crate::templates::{DEFAULT_QUOTA_BYTES, FileTemplateStore, MemoryTemplateStore, TemplateStore};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// JSON file for saved templates; `None` keeps them in memory only.
    pub template_store_path: Option<PathBuf>,
    /// Size limit for the template file in bytes.
    pub template_quota_bytes: usize,
    /// TTF/OTF font for ad text; `None` uses the built-in bitmap font.
    pub font_path: Option<PathBuf>,
    /// Timeout for remote image fetches (presets, batch rows).
    pub fetch_timeout_secs: u64,
    /// Body limit for image and CSV uploads.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:8080".to_string(),
            template_store_path: None,
            template_quota_bytes: DEFAULT_QUOTA_BYTES,
            font_path: None,
            fetch_timeout_secs: 15,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// The single editing session.
    pub session: RwLock<AdComposer>,
    pub templates: Arc<dyn TemplateStore>,
    pub fetcher: Arc<dyn ImageFetcher>,
    pub gate: ExportGate,
}

impl AppState {
    /// Build state from configuration: font, HTTP fetcher and template store.
    pub fn new(config: ServerConfig) -> Result<Self> {
        let font = match &config.font_path {
            Some(path) => {
                info!(path = %path.display(), "loading ad font");
                TextFont::from_file(path)?
            }
            None => TextFont::Bitmap,
        };

        let fetcher: Arc<dyn ImageFetcher> = Arc::new(HttpImageFetcher::new(Duration::from_secs(
            config.fetch_timeout_secs,
        ))?);

        let templates: Arc<dyn TemplateStore> = match &config.template_store_path {
            Some(path) => Arc::new(FileTemplateStore::with_quota(
                path.clone(),
                config.template_quota_bytes,
            )),
            None => Arc::new(MemoryTemplateStore::new()),
        };

        let composer = AdComposer::new(ProductContent::default(), TemplateSettings::default(), font);
        Ok(Self::with_parts(config, composer, templates, fetcher))
    }

    /// Assemble state from explicit parts.
    pub fn with_parts(
        config: ServerConfig,
        composer: AdComposer,
        templates: Arc<dyn TemplateStore>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            config,
            session: RwLock::new(composer),
            templates,
            fetcher,
            gate: ExportGate::new(),
        }
    }
}
