//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::converter::{Converter, ConverterStatus, InstallGuidance};
use crate::core::ServiceConfig;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Human-readable summary
    pub message: String,
    /// Result of the converter availability check
    pub converter: ConverterHealth,
}

/// Converter section of the health payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterHealth {
    pub available: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl From<ConverterStatus> for ConverterHealth {
    fn from(status: ConverterStatus) -> Self {
        Self {
            available: status.available,
            message: status.message,
            version: status.version,
        }
    }
}

/// Successful conversion response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub success: bool,
    /// Number of pages returned
    pub count: usize,
    /// One SVG document per page, in page order
    pub svgs: Vec<String>,
}

impl ConvertResponse {
    pub fn new(svgs: Vec<String>) -> Self {
        Self {
            success: true,
            count: svgs.len(),
            svgs,
        }
    }
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Short error summary
    pub error: String,
    /// Detail, including converter diagnostics when available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Installation hints when the converter is missing
    #[serde(skip_serializing_if = "Option::is_none")]
    pub installation: Option<InstallGuidance>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
            installation: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_installation(mut self, installation: InstallGuidance) -> Self {
        self.installation = Some(installation);
        self
    }
}

/// API server state.
///
/// Holds the resolved service configuration and the converter shared by all requests.
#[derive(Clone)]
pub struct ApiState {
    pub config: Arc<ServiceConfig>,
    pub converter: Arc<dyn Converter>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("config", &self.config)
            .field("converter", &self.converter.name())
            .finish()
    }
}
