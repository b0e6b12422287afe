use annotations::feature::Feature;
use foundation::bounds::ImageRect;
use tracing::debug;

use crate::protocol::{
    AvailableImagesResponse, HexBin, HexBinsRequest, HexBinsResponse, ScopedAnnotations,
    ScopedAnnotationsRequest,
};

/// Error type for annotation store operations.
#[derive(Debug)]
pub struct FetchError {
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as _)
    }
}

impl FetchError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// HTTP client for the annotation store.
///
/// All calls are suspension points for the hosting event loop; callers
/// pair them with a request token and discard stale completions. An empty
/// payload is a valid outcome (no annotations in view), distinct from an
/// `Err`.
#[derive(Debug, Clone)]
pub struct HttpAnnotationClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpAnnotationClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { http, base_url }
    }

    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `GET /annotations/{filename}` — whole-file load.
    pub async fn annotations_for_file(&self, filename: &str) -> Result<Vec<Feature>, FetchError> {
        let url = self.endpoint(&format!("annotations/{filename}"));
        debug!(%url, "loading annotation file");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::with_source(format!("GET {url} failed"), e))?;
        Self::check_status(&url, &resp)?;
        resp.json::<Vec<Feature>>()
            .await
            .map_err(|e| FetchError::with_source(format!("invalid annotation payload from {url}"), e))
    }

    /// `POST /get_normalized_annotations {bounds, filename}` — features
    /// scoped to the given image-space bounds, keyed by source file.
    pub async fn scoped_annotations(
        &self,
        bounds: &ImageRect,
        filename: &str,
    ) -> Result<ScopedAnnotations, FetchError> {
        let url = self.endpoint("get_normalized_annotations");
        let body = ScopedAnnotationsRequest {
            bounds: (*bounds).into(),
            filename: filename.to_string(),
        };
        debug!(%url, filename, "fetching viewport-scoped annotations");
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::with_source(format!("POST {url} failed"), e))?;
        Self::check_status(&url, &resp)?;
        resp.json::<ScopedAnnotations>()
            .await
            .map_err(|e| FetchError::with_source(format!("invalid scoped payload from {url}"), e))
    }

    /// `POST /get_hex_bins {dzi_file, resolution}` — precomputed bins.
    pub async fn hex_bins(
        &self,
        dzi_file: &str,
        resolution: u32,
    ) -> Result<Vec<HexBin>, FetchError> {
        let url = self.endpoint("get_hex_bins");
        let body = HexBinsRequest {
            dzi_file: dzi_file.to_string(),
            resolution,
        };
        debug!(%url, dzi_file, resolution, "fetching hex bins");
        let resp = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| FetchError::with_source(format!("POST {url} failed"), e))?;
        Self::check_status(&url, &resp)?;
        let parsed: HexBinsResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::with_source(format!("invalid hex bin payload from {url}"), e))?;
        Ok(parsed.hex_bins)
    }

    /// `GET /available_images`.
    pub async fn available_images(&self) -> Result<Vec<String>, FetchError> {
        let url = self.endpoint("available_images");
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::with_source(format!("GET {url} failed"), e))?;
        Self::check_status(&url, &resp)?;
        let parsed: AvailableImagesResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::with_source(format!("invalid image list from {url}"), e))?;
        Ok(parsed.images)
    }

    /// `POST /link_annotation_to_dzi` (multipart) — associates an uploaded
    /// annotation file with an image. Fire-and-forget from the engine's
    /// perspective; only transport failures are reported.
    pub async fn link_annotation_to_dzi(
        &self,
        dzi_file: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<(), FetchError> {
        let url = self.endpoint("link_annotation_to_dzi");
        let part = reqwest::multipart::Part::bytes(contents).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("dziFile", dzi_file.to_string());
        debug!(%url, dzi_file, filename, "linking annotation file");
        let resp = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| FetchError::with_source(format!("POST {url} failed"), e))?;
        Self::check_status(&url, &resp)
    }

    fn check_status(url: &str, resp: &reqwest::Response) -> Result<(), FetchError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(FetchError::new(format!("{url} returned {status}")))
    }
}

#[cfg(test)]
mod tests {
    use super::{FetchError, HttpAnnotationClient};

    #[test]
    fn endpoint_joins_without_duplicate_slashes() {
        let client = HttpAnnotationClient::new("http://localhost:5000/");
        assert_eq!(
            client.endpoint("/get_hex_bins"),
            "http://localhost:5000/get_hex_bins"
        );
        assert_eq!(
            client.endpoint("annotations/a.geojson"),
            "http://localhost:5000/annotations/a.geojson"
        );
    }

    #[test]
    fn fetch_error_chains_its_source() {
        let inner = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        let err = FetchError::with_source("fetch failed", inner);
        assert_eq!(err.to_string(), "fetch failed");
        assert!(std::error::Error::source(&err).is_some());
    }
}
