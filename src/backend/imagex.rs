//! HTTP client for the ERDAS ImageX protocol.
//!
//! Both operations are plain GET requests against a single endpoint:
//!
//! - describe: `?request=dsinfo&layers={id}`, answered with an XML element
//!   whose `width` and `height` attributes give the native size
//! - render: `?request=image&cache=true&transparent=true&layers={id}`
//!   `&tlx=&tly=&brx=&bry=&sizex=&sizey=`, answered with JPEG bytes

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;
use url::Url;

use super::{ImageBackend, RenderQuery};
use crate::error::BackendError;
use crate::iiif::NativeDimensions;

/// Default bound on a single backend call.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

/// ImageX implementation of [`ImageBackend`].
#[derive(Debug, Clone)]
pub struct ImageXClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl ImageXClient {
    /// Create a client for `base_url` + `path`, e.g.
    /// `http://imageserver` + `/erdas-iws/erdas/imagex/prmap`.
    ///
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: &str, path: &str, timeout: Duration) -> Result<Self, BackendError> {
        let raw = format!("{}{}", base_url.trim_end_matches('/'), path);
        let endpoint =
            Url::parse(&raw).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", raw, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self { client, endpoint })
    }

    /// The ImageX endpoint all requests are sent to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// URL of the describe call for `identifier`.
    pub fn describe_url(&self, identifier: &str) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("request", "dsinfo")
            .append_pair("layers", identifier);
        url
    }

    /// URL of the render call for `query`.
    ///
    /// Quality has no ImageX counterpart and is not sent.
    pub fn render_url(&self, query: &RenderQuery) -> Url {
        let (tlx, tly) = query.top_left();
        let (brx, bry) = query.bottom_right();

        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("request", "image")
            .append_pair("cache", "true")
            .append_pair("transparent", "true")
            .append_pair("layers", &query.identifier)
            .append_pair("tlx", &tlx.to_string())
            .append_pair("tly", &tly.to_string())
            .append_pair("brx", &brx.to_string())
            .append_pair("bry", &bry.to_string())
            .append_pair("sizex", &query.size.width.to_string())
            .append_pair("sizey", &query.size.height.to_string());
        url
    }

    async fn fetch(&self, url: Url) -> Result<Bytes, BackendError> {
        debug!(url = %url, "ImageX request");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response.bytes().await.map_err(map_reqwest_error)
    }
}

#[async_trait]
impl ImageBackend for ImageXClient {
    async fn describe(&self, identifier: &str) -> Result<NativeDimensions, BackendError> {
        let body = self.fetch(self.describe_url(identifier)).await?;
        parse_dimensions(&body)
    }

    async fn render(&self, query: &RenderQuery) -> Result<Bytes, BackendError> {
        debug!(identifier = %query.identifier, quality = %query.quality, "Rendering");
        self.fetch(self.render_url(query)).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Timeout(err.to_string())
    } else {
        BackendError::Connection(err.to_string())
    }
}

/// Read native dimensions from a describe response.
///
/// The root element must carry positive integer `width` and `height`
/// attributes.
pub fn parse_dimensions(body: &[u8]) -> Result<NativeDimensions, BackendError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| BackendError::Malformed(format!("describe body is not UTF-8: {}", e)))?;

    let doc = roxmltree::Document::parse(text)
        .map_err(|e| BackendError::Malformed(format!("describe body is not XML: {}", e)))?;
    let root = doc.root_element();

    let attribute = |name: &str| -> Result<u32, BackendError> {
        let value = root.attribute(name).ok_or_else(|| {
            BackendError::Malformed(format!(
                "<{}> has no '{}' attribute",
                root.tag_name().name(),
                name
            ))
        })?;
        value.trim().parse().map_err(|_| {
            BackendError::Malformed(format!("'{}' is not a pixel count: {:?}", name, value))
        })
    };

    let width = attribute("width")?;
    let height = attribute("height")?;

    NativeDimensions::new(width, height)
        .ok_or_else(|| BackendError::Malformed(format!("empty image: {}x{}", width, height)))
}
