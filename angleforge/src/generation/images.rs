//! Local storage for generated images.
//!
//! Image URLs returned by the provider expire, so saved content keeps its own copy on disk. Files
//! live in a single flat directory and are referenced from the database by their public path
//! (`{public_prefix}/{file name}`).

use std::path::{Path, PathBuf};
use tracing::{instrument, warn};

use super::{GenerationError, Result};
use crate::{config::ImagesConfig, types::AngleId};

#[derive(Clone, Debug)]
pub struct ImageStore {
    dir: PathBuf,
    public_prefix: String,
    max_bytes: u64,
    http: reqwest::Client,
}

impl ImageStore {
    pub fn new(config: &ImagesConfig) -> Self {
        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create image download HTTP client");

        Self {
            dir: config.dir.clone(),
            public_prefix: config.public_prefix.trim_end_matches('/').to_string(),
            max_bytes: config.max_bytes,
            http,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for a newly stored image of `angle_id`
    fn file_name(angle_id: AngleId) -> String {
        format!(
            "angle-{}-{}-{:08x}.png",
            angle_id,
            chrono::Utc::now().timestamp_millis(),
            rand::random::<u32>()
        )
    }

    /// Download `url` into the image directory and return its public path.
    ///
    /// The response must declare an `image/*` content type and fit in `max_bytes`. Nothing is
    /// written unless the whole body was accepted.
    #[instrument(skip(self, url), err)]
    pub async fn download(&self, url: &str, angle_id: AngleId) -> Result<String> {
        let mut response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| GenerationError::Provider(format!("image download failed: {e}")))?;

        if !response.status().is_success() {
            return Err(GenerationError::Provider(format!("image download returned {}", response.status())));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !content_type.starts_with("image/") {
            return Err(GenerationError::Provider(format!(
                "image download returned content type '{content_type}'"
            )));
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes
        {
            return Err(self.too_large());
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GenerationError::Provider(format!("image download failed: {e}")))?
        {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large());
            }
            bytes.extend_from_slice(&chunk);
        }

        tokio::fs::create_dir_all(&self.dir).await?;

        let file_name = Self::file_name(angle_id);
        tokio::fs::write(self.dir.join(&file_name), &bytes).await?;

        Ok(format!("{}/{}", self.public_prefix, file_name))
    }

    fn too_large(&self) -> GenerationError {
        GenerationError::Provider(format!("image exceeds {} bytes", self.max_bytes))
    }

    /// Like [`download`](Self::download), but failures are logged and yield `None`.
    pub async fn download_best_effort(&self, url: &str, angle_id: AngleId) -> Option<String> {
        match self.download(url, angle_id).await {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Saving content without image, download failed: {}", e);
                None
            }
        }
    }

    /// Resolve a stored public path back to a file inside the image directory.
    ///
    /// Anything that is not a plain file name under our prefix is rejected.
    fn local_path(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(&self.public_prefix)?.strip_prefix('/')?;
        let valid = !name.is_empty() && !name.contains(['/', '\\']) && name != "." && name != "..";
        valid.then(|| self.dir.join(name))
    }

    /// Remove a stored image. Missing files and foreign paths are logged, never fatal.
    pub async fn delete_best_effort(&self, public_path: &str) {
        let Some(path) = self.local_path(public_path) else {
            warn!("Not deleting image outside the image directory: {}", public_path);
            return;
        };

        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!("Failed to delete image {}: {}", path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    fn store(dir: &Path) -> ImageStore {
        ImageStore::new(&ImagesConfig {
            dir: dir.to_path_buf(),
            public_prefix: "/generated-images/".to_string(),
            serve: false,
            max_bytes: 1024,
        })
    }

    #[test]
    fn test_file_name_shape() {
        let angle_id = uuid::Uuid::new_v4();
        let name = ImageStore::file_name(angle_id);
        let prefix = format!("angle-{angle_id}-");

        assert!(name.starts_with(&prefix));
        assert!(name.ends_with(".png"));
        let rest = &name[prefix.len()..name.len() - 4];
        let (millis, random) = rest.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(random.len(), 8);
        assert!(random.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_local_path_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        assert_eq!(store.local_path("/generated-images/a.png"), Some(dir.path().join("a.png")));
        assert!(store.local_path("/generated-images/../secret").is_none());
        assert!(store.local_path("/generated-images/..").is_none());
        assert!(store.local_path("/other/a.png").is_none());
        assert!(store.local_path("/generated-images/").is_none());
    }

    #[tokio::test]
    async fn test_download_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/img.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"\x89PNG fake".to_vec(), "image/png"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir.path().join("nested"));
        let angle_id = uuid::Uuid::new_v4();

        let public_path = store.download(&format!("{}/img.png", server.uri()), angle_id).await.unwrap();
        assert!(public_path.starts_with(&format!("/generated-images/angle-{angle_id}-")));

        let local = store.local_path(&public_path).unwrap();
        assert_eq!(std::fs::read(&local).unwrap(), b"\x89PNG fake");

        store.delete_best_effort(&public_path).await;
        assert!(!local.exists());

        // Second delete is a logged no-op
        store.delete_best_effort(&public_path).await;
    }

    #[tokio::test]
    async fn test_failed_download_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let saved = store
            .download_best_effort(&format!("{}/gone.png", server.uri()), uuid::Uuid::new_v4())
            .await;
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_oversized_download_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/huge.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 4096], "image/png"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let err = store
            .download(&format!("{}/huge.png", server.uri()), uuid::Uuid::new_v4())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("exceeds 1024 bytes"), "unexpected error: {err}");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_non_image_download_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(b"<html></html>".to_vec(), "text/html"))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());

        let saved = store
            .download_best_effort(&format!("{}/page", server.uri()), uuid::Uuid::new_v4())
            .await;
        assert!(saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
