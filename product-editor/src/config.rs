use std::env::{self, VarError};

/// Where the admin panel talks to and where uploaded images are served from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base address of the storefront API, without the `/api` suffix.
    pub backend_url: String,
    /// Public host that serves `/uploads/...`. Prefixed to the relative
    /// paths returned by the image endpoint.
    pub app_host: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable {0}")]
    Missing(&'static str),
    #[error("Environment variable {0} is not valid unicode")]
    NotUnicode(&'static str),
    #[error("Environment variable {0} must be an http(s) URL, got {1:?}")]
    NotAUrl(&'static str, String),
}

impl Config {
    /// Read configuration from the environment.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a `.env` file.
    ///
    /// - BACKEND_URL: storefront API address, e.g. http://127.0.0.1:8000
    /// - APP_HOST: public host for uploaded images, e.g. https://shop.example
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| env::var(name))
    }

    /// Like [`Config::from_env`], reading variables through `lookup`.
    pub fn from_vars(
        lookup: impl Fn(&str) -> Result<String, VarError>,
    ) -> Result<Self, ConfigError> {
        Ok(Config {
            backend_url: url_var(&lookup, "BACKEND_URL")?,
            app_host: url_var(&lookup, "APP_HOST")?,
        })
    }

    /// Absolute URL for an image path returned by the upload endpoint.
    pub fn image_url(&self, relative_path: &str) -> String {
        format!(
            "{}/uploads/{}",
            self.app_host.trim_end_matches('/'),
            relative_path
        )
    }
}

fn url_var(
    lookup: impl Fn(&str) -> Result<String, VarError>,
    name: &'static str,
) -> Result<String, ConfigError> {
    let value = match lookup(name) {
        Ok(value) => value,
        Err(VarError::NotPresent) => return Err(ConfigError::Missing(name)),
        Err(VarError::NotUnicode(_)) => {
            return Err(ConfigError::NotUnicode(name));
        }
    };
    let value = value.trim().to_string();
    if !(value.starts_with("http://") || value.starts_with("https://")) {
        return Err(ConfigError::NotAUrl(name, value));
    }
    Ok(value)
}
