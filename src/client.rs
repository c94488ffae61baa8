use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use crate::acquisition::EncodedImage;
use crate::analysis::{AnalysisResult, AnalyzeRequest};

pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to analyze image";

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    /// Message relayed from the server's `error` field.
    #[error("{0}")]
    Server(String),
    #[error("Request to analysis server failed: {0}")]
    Transport(String),
    #[error("Unexpected analysis response: {0}")]
    Decode(String),
}

/// Talks to a running `/api/analyze` endpoint. One attempt per call.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: Client,
    endpoint: String,
}

fn error_message_from_body(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(|error| error.as_str())
                .map(|message| message.trim().to_string())
        })
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| GENERIC_FAILURE_MESSAGE.to_string())
}

/// Accepts either the result object or the older string-wrapped form.
pub fn parse_analysis_body(body: &str) -> Result<AnalysisResult, AnalyzeError> {
    let value: Value =
        serde_json::from_str(body).map_err(|err| AnalyzeError::Decode(err.to_string()))?;
    let value = match value {
        Value::String(inner) => {
            debug!("Analysis body was string-wrapped; decoding inner JSON");
            serde_json::from_str(&inner).map_err(|err| AnalyzeError::Decode(err.to_string()))?
        }
        other => other,
    };
    serde_json::from_value(value).map_err(|err| AnalyzeError::Decode(err.to_string()))
}

impl AnalysisClient {
    pub fn new(http: Client, server_url: &str) -> Self {
        Self {
            http,
            endpoint: format!("{}/api/analyze", server_url.trim().trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn analyze(&self, image: &EncodedImage) -> Result<AnalysisResult, AnalyzeError> {
        let request = AnalyzeRequest {
            image: image.as_str().to_string(),
        };
        let response = self
            .http
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| AnalyzeError::Transport(err.to_string()))?;

        if !status.is_success() {
            let message = error_message_from_body(&body);
            warn!("Analysis request failed with status {}: {}", status, message);
            return Err(AnalyzeError::Server(message));
        }

        parse_analysis_body(&body)
    }
}
