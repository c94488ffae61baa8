use std::env;

use anyhow::Result;
use once_cell::sync::Lazy;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub bind_addr: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub gemini_timeout_seconds: u64,
    pub max_upload_bytes: usize,
    pub analyze_server_url: String,
    pub camera_device: String,
}

pub static CONFIG: Lazy<Config> =
    Lazy::new(|| Config::load().expect("Failed to load configuration"));

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

fn normalize_base_url(value: String) -> String {
    value.trim().trim_end_matches('/').to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        let max_upload_bytes = env_usize("MAX_UPLOAD_BYTES", 10 * 1024 * 1024);
        if max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than zero"));
        }

        Ok(Config {
            log_level: env_string("LOG_LEVEL", "info").to_lowercase(),
            bind_addr: env_string("BIND_ADDR", "0.0.0.0:3000"),
            gemini_api_key: env_string("GEMINI_API_KEY", ""),
            gemini_model: env_string("GEMINI_MODEL", "gemini-2.5-flash"),
            gemini_api_base: normalize_base_url(env_string(
                "GEMINI_API_BASE",
                "https://generativelanguage.googleapis.com/v1beta",
            )),
            gemini_timeout_seconds: env_u64("GEMINI_TIMEOUT_SECONDS", 90),
            max_upload_bytes,
            analyze_server_url: normalize_base_url(env_string(
                "ANALYZE_SERVER_URL",
                "http://127.0.0.1:3000",
            )),
            camera_device: env_string("CAMERA_DEVICE", "/dev/video0"),
        })
    }
}

pub const FACE_SHAPE_PROMPT: &str = "Identify the shape of this face to determine which style of glasses would suit them. Also give examples of celebrities with the same face shape. Then suggest 3 styles of glasses that would suit this face shape and explain why. Finally, recommend 3 specific glasses, each with a link to a page where they can be viewed or bought.";
