//! Export settings and format resolution.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AdForgeError, Result as AdResult};

/// Largest accepted target side, in logical pixels (exports at twice this).
pub const MAX_TARGET_SIDE: u32 = 8192;

/// Export formats offered by the editor.
///
/// `Svg` is declared for compatibility with saved settings but has no encode
/// path; [`ExportFormat::resolve`] turns it into an explicit error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[default]
    #[serde(rename = "PNG", alias = "png")]
    Png,
    #[serde(rename = "PDF", alias = "pdf")]
    Pdf,
    #[serde(rename = "JPG", alias = "jpg", alias = "JPEG", alias = "jpeg")]
    Jpg,
    #[serde(rename = "SVG", alias = "svg")]
    Svg,
}

/// A format with a working encoder, plus its encoder parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Png,
    Jpeg { quality: u8 },
    Pdf,
}

impl ExportFormat {
    /// Resolve to an encoder, or `None` when the format has no encode path.
    ///
    /// `quality` is a percentage; it only matters for JPEG and is clamped to 1–100.
    pub fn resolve(self, quality: u8) -> Option<Encoding> {
        match self {
            ExportFormat::Png => Some(Encoding::Png),
            ExportFormat::Jpg => Some(Encoding::Jpeg {
                quality: quality.clamp(1, 100),
            }),
            ExportFormat::Pdf => Some(Encoding::Pdf),
            ExportFormat::Svg => None,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Some(ExportFormat::Png),
            "pdf" => Some(ExportFormat::Pdf),
            "jpg" | "jpeg" => Some(ExportFormat::Jpg),
            "svg" => Some(ExportFormat::Svg),
            _ => None,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Jpg => "JPG",
            ExportFormat::Svg => "SVG",
        };
        f.write_str(name)
    }
}

impl Encoding {
    /// Lowercase file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Encoding::Png => "png",
            Encoding::Jpeg { .. } => "jpg",
            Encoding::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            Encoding::Png => "image/png",
            Encoding::Jpeg { .. } => "image/jpeg",
            Encoding::Pdf => "application/pdf",
        }
    }
}

/// Output size in pixels, before the export pixel density is applied.
///
/// Deserialization rejects sizes that fail [`TargetSize::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTargetSize")]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub label: String,
}

#[derive(Deserialize)]
struct RawTargetSize {
    width: u32,
    height: u32,
    #[serde(default)]
    label: String,
}

impl TryFrom<RawTargetSize> for TargetSize {
    type Error = AdForgeError;

    fn try_from(raw: RawTargetSize) -> AdResult<Self> {
        let size = TargetSize {
            width: raw.width,
            height: raw.height,
            label: raw.label,
        };
        size.validate()?;
        Ok(size)
    }
}

impl TargetSize {
    pub fn new(width: u32, height: u32, label: &str) -> Self {
        Self {
            width,
            height,
            label: label.to_string(),
        }
    }

    /// Both sides must be in `1..=MAX_TARGET_SIDE`.
    pub fn validate(&self) -> AdResult<()> {
        let in_range = |side: u32| (1..=MAX_TARGET_SIDE).contains(&side);
        if in_range(self.width) && in_range(self.height) {
            Ok(())
        } else {
            Err(AdForgeError::InvalidSize(format!(
                "{}x{} (each side must be 1 to {})",
                self.width, self.height, MAX_TARGET_SIDE
            )))
        }
    }

    /// Built-in sizes offered by the editor.
    pub fn built_in() -> Vec<TargetSize> {
        vec![
            TargetSize::new(1080, 1080, "Instagram Post"),
            TargetSize::new(1080, 1920, "Instagram Story"),
            TargetSize::new(1200, 630, "Facebook Post"),
            TargetSize::new(1200, 675, "Twitter Post"),
            TargetSize::new(2480, 3508, "A4 Print"),
        ]
    }

    /// Parse `WIDTHxHEIGHT` (e.g. `1080x1080`).
    pub fn parse(s: &str) -> Result<Self, String> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("Size '{}' must look like 1080x1080", s))?;
        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| format!("Invalid width in '{}'", s))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| format!("Invalid height in '{}'", s))?;
        let size = TargetSize::new(width, height, "Custom");
        size.validate().map_err(|e| e.to_string())?;
        Ok(size)
    }
}

impl Default for TargetSize {
    fn default() -> Self {
        TargetSize::new(1080, 1080, "Instagram Post")
    }
}

fn default_quality() -> u8 {
    92
}

fn default_filename() -> String {
    "product-ad".to_string()
}

/// Settings for a single export or a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    #[serde(default)]
    pub format: ExportFormat,
    /// Percentage, JPEG only.
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default)]
    pub target_size: TargetSize,
    /// Filename prefix for downloads and archive entries.
    #[serde(default = "default_filename")]
    pub filename: String,
    /// Add a `manifest.json` to batch archives.
    #[serde(default)]
    pub include_metadata: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            quality: default_quality(),
            target_size: TargetSize::default(),
            filename: default_filename(),
            include_metadata: false,
        }
    }
}

impl ExportSettings {
    pub fn encoding(&self) -> Option<Encoding> {
        self.format.resolve(self.quality)
    }
}
