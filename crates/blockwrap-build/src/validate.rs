//! Remote validation of a manifest against the platform's block schema.

use blockwrap_core::{ManifestDocument, ValidationSettings};
use serde::Deserialize;

/// Client for the block-schema validation endpoint.
pub struct ManifestValidator {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ValidationResponse {
    data: ValidationData,
}

#[derive(Debug, Deserialize)]
struct ValidationData {
    valid: bool,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

impl ManifestValidator {
    pub fn new(settings: &ValidationSettings) -> Result<Self, ValidationError> {
        let client = reqwest::Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| ValidationError::Client { source: e })?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
        })
    }

    /// POST the manifest and fail unless the platform accepts it.
    pub async fn validate(&self, manifest: &ManifestDocument) -> Result<(), ValidationError> {
        tracing::info!(endpoint = %self.endpoint, "validating manifest");

        let request_error = |e| ValidationError::Request {
            endpoint: self.endpoint.clone(),
            source: e,
        };

        let response: ValidationResponse = self
            .client
            .post(&self.endpoint)
            .json(manifest)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(request_error)?
            .json()
            .await
            .map_err(request_error)?;

        if response.data.valid {
            tracing::info!("manifest accepted by the platform");
            Ok(())
        } else {
            Err(ValidationError::Rejected {
                errors: response
                    .data
                    .errors
                    .iter()
                    .map(|e| match e {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect(),
            })
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("failed to create HTTP client")]
    Client { source: reqwest::Error },

    #[error("manifest validation request to {endpoint} failed")]
    Request {
        endpoint: String,
        source: reqwest::Error,
    },

    #[error("manifest rejected by the platform:\n  - {}", .errors.join("\n  - "))]
    Rejected { errors: Vec<String> },
}
