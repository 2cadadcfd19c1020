//! Product content: the text and image shown on an ad.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The product image attached to an ad.
///
/// On the wire this is a single string: either a plain URL or a
/// `data:<mime>;base64,<payload>` URL carrying the encoded bitmap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductImage {
    /// External reference (preset or CSV row) that still needs fetching.
    Url(String),
    /// Self-contained encoded bitmap; export never needs the network.
    Encoded { mime: String, data: Vec<u8> },
}

impl ProductImage {
    /// Wrap PNG bytes produced by the preprocessor.
    pub fn png(data: Vec<u8>) -> Self {
        ProductImage::Encoded {
            mime: "image/png".to_string(),
            data,
        }
    }

    /// Encoded bytes, if the image is self-contained.
    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            ProductImage::Encoded { data, .. } => Some(data),
            ProductImage::Url(_) => None,
        }
    }

    pub fn is_encoded(&self) -> bool {
        matches!(self, ProductImage::Encoded { .. })
    }

    fn to_wire(&self) -> String {
        match self {
            ProductImage::Url(url) => url.clone(),
            ProductImage::Encoded { mime, data } => {
                format!("data:{};base64,{}", mime, STANDARD.encode(data))
            }
        }
    }

    fn from_wire(value: &str) -> Result<Self, String> {
        let Some(rest) = value.strip_prefix("data:") else {
            return Ok(ProductImage::Url(value.to_string()));
        };

        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| "data URL is missing ','".to_string())?;
        let mime = header
            .strip_suffix(";base64")
            .ok_or_else(|| "only base64 data URLs are supported".to_string())?;
        let data = STANDARD
            .decode(payload.trim())
            .map_err(|e| format!("invalid base64 image data: {}", e))?;

        Ok(ProductImage::Encoded {
            mime: mime.to_string(),
            data,
        })
    }
}

impl Serialize for ProductImage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_wire())
    }
}

impl<'de> Deserialize<'de> for ProductImage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        ProductImage::from_wire(&value).map_err(serde::de::Error::custom)
    }
}

/// Product fields rendered onto the ad.
///
/// `price` is free-form currency text ("$1,299", "from 499 EUR") and is never
/// parsed as a number. `specifications` is pipe-delimited: `"6.1\" OLED|128GB|5G"`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductContent {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub brand: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub specifications: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ProductImage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
}

impl ProductContent {
    /// Specification entries split on `|`, trimmed, empties dropped.
    pub fn spec_lines(&self) -> Vec<&str> {
        self.specifications
            .split('|')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}
