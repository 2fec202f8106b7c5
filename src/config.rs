use crate::fetch::RetryConfig;
use crate::stream::Delays;

#[derive(Clone, Debug)]
pub struct Config {
    pub api_base: String,
    pub plots_base: String,
    pub animal_base: String,
    pub delays: Delays,
    pub default_stream: String,
    pub lagged_limit: usize,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_base_ms: u64,
    pub retry_max_ms: u64,
    pub bar_width: usize,
}

impl Config {
    pub fn from_env() -> Self {
        let d = Self::defaults();
        Self {
            api_base: with_slash(std::env::var("STREAMDASH_API_BASE").unwrap_or(d.api_base)),
            plots_base: with_slash(std::env::var("STREAMDASH_PLOTS_BASE").unwrap_or(d.plots_base)),
            animal_base: with_slash(std::env::var("STREAMDASH_ANIMAL_BASE").unwrap_or(d.animal_base)),
            delays: std::env::var("STREAMDASH_DELAYS").ok().map(|v| Delays::parse_list(&v)).unwrap_or(d.delays),
            default_stream: std::env::var("STREAMDASH_STREAM").unwrap_or(d.default_stream),
            lagged_limit: env_parse("STREAMDASH_LAGGED_LIMIT").unwrap_or(d.lagged_limit),
            http_timeout_secs: env_parse("STREAMDASH_TIMEOUT_SECS").unwrap_or(d.http_timeout_secs),
            user_agent: std::env::var("STREAMDASH_USER_AGENT").unwrap_or(d.user_agent),
            max_retries: env_parse("STREAMDASH_MAX_RETRIES").unwrap_or(d.max_retries),
            retry_base_ms: env_parse("STREAMDASH_RETRY_BASE_MS").unwrap_or(d.retry_base_ms),
            retry_max_ms: env_parse("STREAMDASH_RETRY_MAX_MS").unwrap_or(d.retry_max_ms),
            bar_width: env_parse("STREAMDASH_BAR_WIDTH").unwrap_or(d.bar_width),
        }
    }

    /// Config pointing every endpoint at one base url. Used by tests and local mirrors.
    pub fn for_base(base: &str) -> Self {
        let base = with_slash(base.to_string());
        Self {
            api_base: base.clone(),
            plots_base: base.clone(),
            animal_base: format!("{}animal/", base),
            ..Self::defaults()
        }
    }

    pub fn defaults() -> Self {
        Self {
            api_base: "https://api.microprediction.org/".to_string(),
            plots_base: "https://plots.microprediction.org/".to_string(),
            animal_base: "https://devapi.microprediction.org/animal/".to_string(),
            delays: Delays::default(),
            default_stream: "hospital_bike_activity".to_string(),
            lagged_limit: 50,
            http_timeout_secs: 10,
            user_agent: "streamdash/0.1".to_string(),
            max_retries: 0,
            retry_base_ms: 200,
            retry_max_ms: 5000,
            bar_width: 40,
        }
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            base_delay_ms: self.retry_base_ms,
            max_delay_ms: self.retry_max_ms,
            ..Default::default()
        }
    }

    /// Apply a `--key=value` override. Returns false for unknown keys.
    pub fn apply_override(&mut self, key: &str, value: &str) -> bool {
        match key {
            "api-base" => self.api_base = with_slash(value.to_string()),
            "plots-base" => self.plots_base = with_slash(value.to_string()),
            "animal-base" => self.animal_base = with_slash(value.to_string()),
            "delays" => self.delays = Delays::parse_list(value),
            "timeout" => {
                if let Ok(v) = value.parse() {
                    self.http_timeout_secs = v;
                }
            }
            "retries" => {
                if let Ok(v) = value.parse() {
                    self.max_retries = v;
                }
            }
            "lagged-limit" => {
                if let Ok(v) = value.parse() {
                    self.lagged_limit = v;
                }
            }
            _ => return false,
        }
        true
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::defaults()
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn with_slash(mut base: String) -> String {
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}
