use crate::{Product, ProductId, requests, responses};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use serde::Serialize;

type ReqwestResult = Result<reqwest::Response, reqwest::Error>;

/// An API client for interfacing with the storefront backend.
#[derive(Debug, Clone)]
pub struct APIClient {
    pub address: String,
    pub inner_client: reqwest::Client,
}

/// Helper methods for http actions
impl APIClient {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            inner_client: reqwest::Client::new(),
        }
    }

    fn format_url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.address.trim_end_matches('/'))
    }

    async fn empty_get(&self, path: &str) -> ReqwestResult {
        let request = self.inner_client.get(self.format_url(path));

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }

    async fn patch_form(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> ReqwestResult {
        let request = self.inner_client.patch(self.format_url(path)).form(body);

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }

    async fn post_multipart(&self, path: &str, form: Form) -> ReqwestResult {
        let request =
            self.inner_client.post(self.format_url(path)).multipart(form);

        #[cfg(target_arch = "wasm32")]
        let request = request.fetch_credentials_include();

        request.send().await
    }
}

/// Methods on the backend API
impl APIClient {
    /// Fetch the canonical record for a product.
    pub async fn get_product(
        &self,
        product_id: &ProductId,
    ) -> Result<Product, ClientError> {
        let response = self.empty_get(&format!("products/{product_id}")).await?;
        ok_body(response).await
    }

    /// Store an image, returning its path relative to the uploads directory.
    pub async fn upload_image(
        &self,
        upload: requests::ImageUpload,
    ) -> Result<responses::StoredImage, ClientError> {
        let part = Part::bytes(upload.bytes).file_name(upload.file_name);
        let form = Form::new().part("image", part);
        let response = self.post_multipart("images", form).await?;
        ok_body(response).await
    }

    /// Partially update a product. The response body is not used.
    pub async fn update_product(
        &self,
        details: &requests::UpdateProduct,
    ) -> Result<(), ClientError> {
        let response = self
            .patch_form(&format!("products/{}", details.id), details)
            .await?;
        ok_empty(response).await
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// A non-success response, containing status and response text.
    #[error("{1}")]
    APIError(StatusCode, String),
    #[error("Network error. Please check your connection.")]
    Network(#[from] reqwest::Error),
    /// A success response whose body did not have the expected shape.
    #[error("Unexpected response body ({status}): {source}")]
    UnexpectedShape {
        status: StatusCode,
        #[source]
        source: serde_json::Error,
    },
}

/// Deserialize a successful request into the desired type, or return an
/// appropriate error.
pub async fn ok_body<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ClientError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::APIError(status, response.text().await?));
    }
    let body = response.text().await?;
    responses::parse_body(&body)
        .map_err(|source| ClientError::UnexpectedShape { status, source })
}

/// Check that an empty response is OK, returning a ClientError if not.
pub async fn ok_empty(response: reqwest::Response) -> Result<(), ClientError> {
    if !response.status().is_success() {
        return Err(ClientError::APIError(
            response.status(),
            response.text().await?,
        ));
    }
    Ok(())
}
