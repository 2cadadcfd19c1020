//! Remote image fetching for presets and batch rows.
//!
//! A failed fetch never fails the surrounding operation: the caller gets
//! `None` and carries on without an image.

use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};

use super::remove_background;
use crate::error::{AdForgeError, Result};
use crate::model::ProductImage;

/// Source of raw image bytes addressed by URL.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Plain HTTP GET fetcher.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
}

impl HttpImageFetcher {
    /// Build a fetcher whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("adforge/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| AdForgeError::Fetch(format!("HTTP client error: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AdForgeError::Fetch(format!("Failed to download {}: {}", url, e)))?;
        if !response.status().is_success() {
            return Err(AdForgeError::Fetch(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AdForgeError::Fetch(format!("Failed to read image data: {}", e)))?;
        Ok(bytes.to_vec())
    }
}

/// Fetch an image and remove its background.
///
/// Returns `None` if the fetch fails. If only background removal fails the
/// original bytes are kept, so the result is always self-contained.
pub async fn load_remote_image(fetcher: &dyn ImageFetcher, url: &str) -> Option<ProductImage> {
    let bytes = match fetcher.fetch(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("continuing without image: {}", e);
            return None;
        }
    };

    let processed = tokio::task::spawn_blocking(move || remove_background(&bytes, None))
        .await
        .ok()?;
    info!(url, removed = processed.removed, "remote image loaded");

    if processed.removed {
        Some(ProductImage::png(processed.bytes))
    } else {
        let mime = image::guess_format(&processed.bytes)
            .map(|f| f.to_mime_type())
            .unwrap_or("application/octet-stream");
        Some(ProductImage::Encoded {
            mime: mime.to_string(),
            data: processed.bytes,
        })
    }
}

/// Make a product image self-contained, fetching it if it is still a URL.
pub async fn resolve_product_image(
    fetcher: &dyn ImageFetcher,
    image: Option<ProductImage>,
) -> Option<ProductImage> {
    match image {
        Some(ProductImage::Url(url)) if url.trim().is_empty() => None,
        Some(ProductImage::Url(url)) => load_remote_image(fetcher, &url).await,
        other => other,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::preprocess::encode_png;
    use image::{Rgba, RgbaImage};
    use std::collections::HashMap;

    /// In-memory fetcher keyed by URL.
    pub(crate) struct MapFetcher(pub HashMap<String, Vec<u8>>);

    #[async_trait]
    impl ImageFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .get(url)
                .cloned()
                .ok_or_else(|| AdForgeError::Fetch(format!("no such url {}", url)))
        }
    }

    fn white_square_png() -> Vec<u8> {
        encode_png(&RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255]))).unwrap()
    }

    #[tokio::test]
    async fn test_load_remote_image_removes_background() {
        let fetcher = MapFetcher(HashMap::from([(
            "https://img/a.png".to_string(),
            white_square_png(),
        )]));

        let image = load_remote_image(&fetcher, "https://img/a.png").await.unwrap();
        let decoded = image::load_from_memory(image.bytes().unwrap()).unwrap().to_rgba8();
        assert!(decoded.pixels().all(|p| p[3] == 0));
    }

    #[tokio::test]
    async fn test_failed_fetch_yields_no_image() {
        let fetcher = MapFetcher(HashMap::new());
        assert!(load_remote_image(&fetcher, "https://img/missing.png").await.is_none());
    }

    #[tokio::test]
    async fn test_undecodable_fetch_keeps_original_bytes() {
        let fetcher = MapFetcher(HashMap::from([(
            "https://img/b".to_string(),
            b"not an image".to_vec(),
        )]));
        let image = load_remote_image(&fetcher, "https://img/b").await.unwrap();
        assert_eq!(image.bytes().unwrap(), b"not an image");
    }

    #[tokio::test]
    async fn test_resolve_keeps_encoded_and_drops_empty_urls() {
        let fetcher = MapFetcher(HashMap::new());
        let encoded = ProductImage::png(vec![1, 2, 3]);
        assert_eq!(
            resolve_product_image(&fetcher, Some(encoded.clone())).await,
            Some(encoded)
        );
        assert_eq!(
            resolve_product_image(&fetcher, Some(ProductImage::Url(" ".to_string()))).await,
            None
        );
    }
}
