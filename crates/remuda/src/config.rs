//! Backend connection configuration.

use std::time::Duration;

/// Configuration for a backend connection.
///
/// Only the base URL is configurable; timeouts are fixed per operation class
/// (see the constants below) since they reflect the shape of the API rather
/// than deployment preferences.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Base URL of the backend, without a trailing slash.
    pub host: String,
}

impl BackendConfig {
    /// Default backend address for a local instance.
    pub const DEFAULT_HOST: &'static str = "http://127.0.0.1:11434";

    /// Timeout for short API calls (blob existence checks).
    pub const API_TIMEOUT: Duration = Duration::from_secs(10);

    /// Timeout for model creation (after blobs are uploaded).
    pub const CREATE_TIMEOUT: Duration = Duration::from_secs(300);

    /// Chunk size for streaming reads and uploads (8 MB).
    pub const CHUNK_SIZE: usize = 8 * 1024 * 1024;

    /// Create a config targeting the given host.
    ///
    /// A trailing `/` is trimmed so endpoint paths can be appended directly.
    pub fn new(host: impl AsRef<str>) -> Self {
        Self {
            host: host.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// URL of the blob endpoint for a digest.
    pub fn blob_url(&self, digest: &str) -> String {
        format!("{}/api/blobs/{}", self.host, digest)
    }

    /// URL of the model-creation endpoint.
    pub fn create_url(&self) -> String {
        format!("{}/api/create", self.host)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_HOST)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_host() {
        let config = BackendConfig::default();
        assert_eq!(config.host, "http://127.0.0.1:11434");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = BackendConfig::new("http://localhost:11434/");
        assert_eq!(config.host, "http://localhost:11434");
        assert_eq!(
            config.blob_url("sha256:abc"),
            "http://localhost:11434/api/blobs/sha256:abc"
        );
    }

    #[test]
    fn test_create_url() {
        let config = BackendConfig::default();
        assert_eq!(config.create_url(), "http://127.0.0.1:11434/api/create");
    }
}
