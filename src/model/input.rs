//! Form input for one hotel submission

use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a submission was refused at the input boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("invalid hotel URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// The three mandatory form fields
///
/// Values are kept exactly as entered; `validate` only checks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotelInput {
    pub url: String,
    pub name: String,
    pub location: String,
}

impl HotelInput {
    pub fn new(
        url: impl Into<String>,
        name: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            location: location.into(),
        }
    }

    /// Check that every field is present and the URL is absolute http(s)
    pub fn validate(&self) -> Result<(), InputError> {
        if self.url.trim().is_empty() {
            return Err(InputError::MissingField("url"));
        }
        if self.name.trim().is_empty() {
            return Err(InputError::MissingField("name"));
        }
        if self.location.trim().is_empty() {
            return Err(InputError::MissingField("location"));
        }

        let parsed = Url::parse(self.url.trim()).map_err(|e| InputError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })?;

        match parsed.scheme() {
            "http" | "https" if parsed.host_str().is_some() => Ok(()),
            "http" | "https" => Err(InputError::InvalidUrl {
                url: self.url.clone(),
                reason: "missing host".to_string(),
            }),
            other => Err(InputError::InvalidUrl {
                url: self.url.clone(),
                reason: format!("unsupported scheme '{}'", other),
            }),
        }
    }
}
