use bytes::Bytes;
use gallery_types::api::{CreateObjectQuery, ListObjectsResponse};
use gallery_types::{Asset, AssetId, OwnerScope};
use reqwest::{Client, Response, StatusCode, header};
use tracing::debug;

use crate::backend::ObjectBackend;
use crate::error::{GalleryError, Result};

/// Backend talking to the gallery HTTP service.
///
/// The service identifies the caller from the bearer token and only ever
/// returns objects tagged with that caller's scope.
pub struct RemoteBackend {
    client: Client,
    base_url: String,
    token: String,
}

impl RemoteBackend {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url, token)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            token: token.into(),
        }
    }

    fn objects_url(&self, container: &str) -> String {
        format!("{}/containers/{}/objects", self.base_url, container)
    }
}

impl ObjectBackend for RemoteBackend {
    async fn list_objects(&self, container: &str) -> Result<Vec<Asset>> {
        let resp = self
            .client
            .get(self.objects_url(container))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(GalleryError::unavailable)?;

        let listing: ListObjectsResponse = ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(GalleryError::unavailable)?;
        debug!("Listed {} objects in {}", listing.total, container);
        Ok(listing.objects)
    }

    async fn create_object(
        &self,
        container: &str,
        id: &AssetId,
        name: &str,
        bytes: Bytes,
        readers: &[OwnerScope],
    ) -> Result<Asset> {
        let resp = self
            .client
            .post(format!("{}/{}", self.objects_url(container), id))
            .bearer_auth(&self.token)
            .query(&CreateObjectQuery::new(name, readers))
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(GalleryError::unavailable)?;

        ensure_success(resp)
            .await?
            .json()
            .await
            .map_err(GalleryError::unavailable)
    }

    async fn delete_object(&self, container: &str, id: &AssetId) -> Result<()> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.objects_url(container), id))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(GalleryError::unavailable)?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Err(GalleryError::NotFound(id.clone()));
        }
        ensure_success(resp).await?;
        Ok(())
    }

    /// Carries the token in the query string, since image elements cannot
    /// send an `Authorization` header.
    fn object_locator(&self, container: &str, id: &AssetId) -> String {
        format!("{}/{}/view?token={}", self.objects_url(container), id, self.token)
    }
}

async fn ensure_success(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(GalleryError::unavailable(format!(
        "gallery service returned {}: {}",
        status, body
    )))
}
