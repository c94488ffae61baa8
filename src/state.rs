use crate::config::Config;
use crate::llm::GeminiClient;

#[derive(Clone)]
pub struct AppState {
    pub gemini: GeminiClient,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(gemini: GeminiClient, max_upload_bytes: usize) -> Self {
        AppState {
            gemini,
            max_upload_bytes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(GeminiClient::from_config(config), config.max_upload_bytes)
    }

    /// Largest request body: a max-size image after base64 plus headroom for
    /// the JSON or multipart envelope.
    pub fn body_limit(&self) -> usize {
        self.max_upload_bytes / 3 * 4 + 64 * 1024
    }
}
