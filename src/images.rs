//! Image URL resolution and download.
//!
//! Maps an item identifier and a display mode to a rendered-image URL
//! on the rendering service, and downloads the bytes. A failed download
//! is a first-class outcome, not an error: delivery degrades to a
//! text-only message.

use bytes::Bytes;
use reqwest::Client as HttpClient;

/// Display variant of an item's rendered image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageMode {
    /// Currently released artwork.
    #[default]
    Live,
    /// Pre-release ("advance") artwork.
    Advance,
}

impl ImageMode {
    /// URL path segment for this mode.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Advance => "advance",
        }
    }
}

/// Outcome of an image download attempt.
#[derive(Debug, Clone)]
pub enum ImageFetch {
    /// Raw image bytes retrieved from the rendering service.
    Fetched(Bytes),
    /// The image could not be retrieved; carries the reason.
    Unavailable(String),
}

/// Client for the image rendering service.
#[derive(Clone)]
pub struct ImageClient {
    http: HttpClient,
    base_url: String,
}

impl ImageClient {
    /// Create a new client for the given base URL.
    #[must_use]
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    /// Resolve the rendered image URL for an item identifier and mode.
    ///
    /// The identifier is not validated; the rendering service answers
    /// with a non-200 status for unknown IDs.
    #[must_use]
    pub fn image_url(&self, id: &str, mode: ImageMode) -> String {
        format!("{}/{}/{id}", self.base_url, mode.path_segment())
    }

    /// Download the rendered image for an item identifier.
    ///
    /// Never fails: a transport error, a non-success status, or a body
    /// read failure all become [`ImageFetch::Unavailable`].
    pub async fn fetch(&self, id: &str, mode: ImageMode) -> ImageFetch {
        let url = self.image_url(id, mode);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => return ImageFetch::Unavailable(format!("request failed: {e}")),
        };

        let status = response.status();
        if !status.is_success() {
            return ImageFetch::Unavailable(format!("status {status}"));
        }

        match response.bytes().await {
            Ok(bytes) => ImageFetch::Fetched(bytes),
            Err(e) => ImageFetch::Unavailable(format!("body read failed: {e}")),
        }
    }
}
