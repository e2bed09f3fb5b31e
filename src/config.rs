use std::path::PathBuf;

use crate::jobs::models::ChunkMode;

/// Service configuration, loaded once at startup from the environment
/// (optionally via a `.env` file in dev), per spec.md §6 / original
/// `settings.py`.
#[derive(Clone, Debug)]
pub struct Config {
    pub storage_root: PathBuf,
    pub redis_url: Option<String>,
    pub rq_retry_max: u32,
    pub rq_retry_interval: u64,
    pub rq_retry_intervals: String,
    pub max_parallel_chunks: usize,
    pub chunk_mode: ChunkMode,
    pub silence_db: String,
    pub silence_min_duration: f64,
    pub max_chunk_seconds: f64,
    pub vad_threshold: f64,
    pub vad_min_speech_ms: u64,
    pub vad_min_silence_ms: u64,
    pub silero_vad_model_path: Option<PathBuf>,
    pub default_lang: String,
    pub fw_model: String,
    pub fw_device: String,
    pub fw_compute: String,
    pub fw_beam_size: u32,
    pub fw_vad_filter: bool,
    pub sponsor_text: String,
    pub pdf_font_dir: Option<PathBuf>,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl Config {
    /// Loads a `.env` file if present (dev convenience, same as the
    /// teacher's `Config::load`), then builds config from the environment.
    pub fn load() -> Self {
        match dotenvy::dotenv() {
            Ok(path) => tracing::info!(?path, "loaded .env file"),
            Err(_) => tracing::debug!("no .env file found, using process environment"),
        }
        Self::from_env()
    }

    /// Builds a config with sane defaults for tests, without touching the
    /// process environment.
    pub fn for_tests(storage_root: PathBuf) -> Self {
        Config {
            storage_root,
            redis_url: None,
            rq_retry_max: 3,
            rq_retry_interval: 0,
            rq_retry_intervals: String::new(),
            max_parallel_chunks: 2,
            chunk_mode: ChunkMode::Silence,
            silence_db: "-35dB".to_string(),
            silence_min_duration: 0.6,
            max_chunk_seconds: 120.0,
            vad_threshold: 0.5,
            vad_min_speech_ms: 250,
            vad_min_silence_ms: 200,
            silero_vad_model_path: None,
            default_lang: "es".to_string(),
            fw_model: "base".to_string(),
            fw_device: "cpu".to_string(),
            fw_compute: "int8".to_string(),
            fw_beam_size: 2,
            fw_vad_filter: false,
            sponsor_text: String::new(),
            pdf_font_dir: None,
        }
    }

    fn from_env() -> Self {
        let chunk_mode = match env_or("CHUNK_MODE", "silence").as_str() {
            "vad" => ChunkMode::Vad,
            _ => ChunkMode::Silence,
        };

        Config {
            storage_root: PathBuf::from(env_or("STORAGE_ROOT", "./_data/transcription")),
            redis_url: std::env::var("REDIS_URL").ok(),
            rq_retry_max: env_parse("RQ_RETRY_MAX", 3),
            rq_retry_interval: env_parse("RQ_RETRY_INTERVAL", 60),
            rq_retry_intervals: env_or("RQ_RETRY_INTERVALS", "10,60,300"),
            max_parallel_chunks: env_parse("MAX_PARALLEL_CHUNKS", 2),
            chunk_mode,
            silence_db: env_or("SILENCE_DB", "-35dB"),
            silence_min_duration: env_parse("SILENCE_MIN_DURATION", 0.6),
            max_chunk_seconds: env_parse("MAX_CHUNK_SECONDS", 120.0),
            vad_threshold: env_parse("VAD_THRESHOLD", 0.5),
            vad_min_speech_ms: env_parse("VAD_MIN_SPEECH_MS", 250),
            vad_min_silence_ms: env_parse("VAD_MIN_SILENCE_MS", 200),
            silero_vad_model_path: std::env::var("SILERO_VAD_MODEL_PATH").ok().map(PathBuf::from),
            default_lang: env_or("TRANSCRIPTION_DEFAULT_LANG", "es"),
            fw_model: env_or("TRANSCRIPTION_FW_MODEL", "base"),
            fw_device: env_or("TRANSCRIPTION_FW_DEVICE", "cpu"),
            fw_compute: env_or("TRANSCRIPTION_FW_COMPUTE", "int8"),
            fw_beam_size: env_parse("TRANSCRIPTION_FW_BEAM_SIZE", 2),
            fw_vad_filter: env_parse("TRANSCRIPTION_FW_VAD_FILTER", false),
            sponsor_text: env_or("TRANSCRIPTION_SPONSOR_TEXT", ""),
            pdf_font_dir: std::env::var("PDF_FONT_DIR").ok().map(PathBuf::from),
        }
    }
}
