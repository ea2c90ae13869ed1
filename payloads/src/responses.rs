use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Successful image upload. `image` is the stored file's path relative to
/// the app host's uploads directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub image: String,
}

/// Error body carrying one human-readable message, used by the image
/// endpoint on failure and by product updates on 403.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

/// Check an error body against the shape a caller expects.
pub fn parse_body<T: DeserializeOwned>(
    body: &str,
) -> Result<T, serde_json::Error> {
    serde_json::from_str(body)
}
