use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::time::Duration;

const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

/// Timing of the KPI count-up animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimationTiming {
    pub duration: Duration,
    pub frame_interval: Duration,
}

impl AnimationTiming {
    /// Number of frames the animation is spread over (`duration / frame_interval`).
    pub fn frames(&self) -> f64 {
        let frame = self.frame_interval.as_secs_f64();
        if frame <= 0.0 {
            return 1.0;
        }
        (self.duration.as_secs_f64() / frame).max(1.0)
    }
}

impl Default for AnimationTiming {
    fn default() -> Self {
        Self {
            duration: Duration::from_millis(800),
            frame_interval: Duration::from_millis(16),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub request_timeout: Duration,
    pub max_file_size: usize,
    pub kpi_animation: AnimationTiming,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            max_file_size: default_max_file_size(),
            kpi_animation: AnimationTiming::default(),
        }
    }
}

impl Config {
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }
}

/// Loads `.env` if present, then reads `DASHBOARD_*` variables over the defaults.
pub fn load_config() -> Result<Config> {
    dotenv().ok();
    from_lookup(|key| std::env::var(key).ok())
}

fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config> {
    let defaults = Config::default();

    let backend_url = lookup("DASHBOARD_BACKEND_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or(defaults.backend_url);

    let request_timeout = match lookup("DASHBOARD_REQUEST_TIMEOUT_SECS") {
        Some(raw) => Duration::from_secs(parse_number(&raw, "DASHBOARD_REQUEST_TIMEOUT_SECS")?),
        None => defaults.request_timeout,
    };

    let max_file_size = match lookup("DASHBOARD_MAX_FILE_SIZE") {
        Some(raw) => parse_number::<usize>(&raw, "DASHBOARD_MAX_FILE_SIZE")?,
        None => defaults.max_file_size,
    };

    let duration = match lookup("DASHBOARD_KPI_DURATION_MS") {
        Some(raw) => Duration::from_millis(parse_number(&raw, "DASHBOARD_KPI_DURATION_MS")?),
        None => defaults.kpi_animation.duration,
    };
    let frame_interval = match lookup("DASHBOARD_KPI_FRAME_MS") {
        Some(raw) => Duration::from_millis(parse_number(&raw, "DASHBOARD_KPI_FRAME_MS")?),
        None => defaults.kpi_animation.frame_interval,
    };
    if frame_interval.is_zero() {
        anyhow::bail!("DASHBOARD_KPI_FRAME_MS must be greater than zero");
    }

    Ok(Config {
        backend_url,
        request_timeout,
        max_file_size,
        kpi_animation: AnimationTiming { duration, frame_interval },
    })
}

fn parse_number<T>(raw: &str, key: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse::<T>()
        .with_context(|| format!("Failed to parse {} from {:?}", key, raw))
}
