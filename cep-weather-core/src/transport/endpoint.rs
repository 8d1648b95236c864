use reqwest::Url;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("invalid base url {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("path template {0:?} has no {{zip_code}} placeholder")]
    MissingPlaceholder(String),
}

/// Fail-fast URL builder.
///
/// Only the constructor can fail; once an `Endpoint` exists every further
/// step operates on a valid absolute http(s) URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: Url,
}

impl Endpoint {
    pub fn new(base_url: &str) -> Result<Self, EndpointError> {
        let invalid = |reason: String| EndpointError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let url = Url::parse(base_url.trim()).map_err(|e| invalid(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
        }
        if url.cannot_be_a_base() || url.host_str().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self { url })
    }

    /// Append `path` to the base path, joining with exactly one slash.
    pub fn path(mut self, path: &str) -> Self {
        let base = self.url.path().trim_end_matches('/');
        let suffix = path.trim_start_matches('/');
        let joined = if suffix.is_empty() { base.to_string() } else { format!("{base}/{suffix}") };

        self.url.set_path(&joined);
        self
    }

    /// Append a percent-encoded query pair.
    pub fn query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }

    pub fn build(self) -> Url {
        self.url
    }
}

/// Substitute `value` for the `{zip_code}` placeholder.
pub fn interpolate_path(template: &str, value: &str) -> Result<String, EndpointError> {
    let placeholder = crate::config::POSTAL_CODE_PLACEHOLDER;
    if !template.contains(placeholder) {
        return Err(EndpointError::MissingPlaceholder(template.to_string()));
    }
    Ok(template.replace(placeholder, value))
}
