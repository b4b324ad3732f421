use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub speech: SpeechConfig,
}

#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the interview backend, e.g. "http://127.0.0.1:8000/api"
    pub base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct SpeechConfig {
    /// Read questions aloud when a synthesis engine is available
    pub synthesis_enabled: bool,

    /// Capture spoken answers when a recognition engine is available
    pub recognition_enabled: bool,

    /// Recognition locale tag, e.g. "en-US"
    pub accent: String,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                base_url: "http://127.0.0.1:8000/api".to_string(),
                request_timeout_secs: 30,
            },
            speech: SpeechConfig {
                synthesis_enabled: true,
                recognition_enabled: true,
                accent: "en-US".to_string(),
            },
        }
    }
}
