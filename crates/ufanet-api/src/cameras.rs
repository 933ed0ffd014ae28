// Camera endpoints
//
// Camera listing relies on the single 401 retry inside `request`; there is
// no password re-login at this layer. Snapshot images live on separate
// screenshot hosts and are fetched with their own short budget.

use tracing::debug;

use crate::auth::CredentialSink;
use crate::client::{ApiRequest, UfanetClient};
use crate::error::Error;
use crate::models::{self, Camera};
use crate::transport::IMAGE_TIMEOUT;

const CAMERAS_PATH: &str = "api/v1/cctv";

impl UfanetClient {
    /// List cameras with prepared stream info.
    ///
    /// `GET api/v1/cctv`
    pub async fn list_cameras(&self, sink: &dyn CredentialSink) -> Result<Vec<Camera>, Error> {
        self.ensure_valid_access(sink).await?;
        let payload = self.request(&ApiRequest::get(CAMERAS_PATH), sink).await?;
        let cameras = models::cameras_from_json(payload.into_json());
        debug!(count = cameras.len(), "listed cameras");
        Ok(cameras)
    }

    /// Download a still image from an absolute snapshot URL.
    ///
    /// The streaming token rides in the query string, so no auth header is
    /// sent. Any status other than 200 yields `Ok(None)`.
    pub async fn fetch_snapshot(&self, url: &str) -> Result<Option<Vec<u8>>, Error> {
        debug!("fetching camera snapshot");
        let resp = self
            .http
            .get(url)
            .timeout(IMAGE_TIMEOUT)
            .send()
            .await
            .map_err(Error::from_transport)?;

        if resp.status() != reqwest::StatusCode::OK {
            debug!(status = %resp.status(), "snapshot not available");
            return Ok(None);
        }
        let bytes = resp.bytes().await.map_err(Error::from_transport)?;
        Ok(Some(bytes.to_vec()))
    }
}
