use std::{env, path::PathBuf, time::Duration};

use crate::error::ConsoleError;

/// Path prefix of every HarborArk API endpoint.
pub const API_PREFIX: &str = "/api/v1";

const DEFAULT_API_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_LOCALE: &str = "zh-cn";
const DEFAULT_STATE_DIR: &str = ".harbor-console";

/// ConsoleConfig
///
/// Holds the console's entire configuration. Loaded once at startup and never
/// mutated afterwards; every component receives a clone or a borrow of it.
#[derive(Clone, Debug)]
pub struct ConsoleConfig {
    // Origin of the HarborArk server, without the `/api/v1` prefix.
    pub api_url: String,
    // Applied to every request by the pipeline.
    pub timeout: Duration,
    // Sent as `Accept-Language` on every request.
    pub locale: String,
    // Directory holding the durable key-value store.
    pub state_dir: PathBuf,
    // Runtime environment marker. Selects the log format.
    pub env: Env,
}

/// Env
///
/// Local runs get human-readable logs and lenient defaults; production
/// requires an explicit API origin and logs JSON.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for ConsoleConfig {
    /// Non-panicking configuration for tests and local scaffolding.
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            locale: DEFAULT_LOCALE.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            env: Env::Local,
        }
    }
}

impl ConsoleConfig {
    /// load
    ///
    /// Reads the configuration from environment variables (call
    /// `dotenv::dotenv()` first to pick up a `.env` file).
    ///
    /// # Errors
    /// Fails fast when `HARBOR_API_URL` is missing in production or when
    /// `HARBOR_API_TIMEOUT_MS` is not a positive integer.
    pub fn load() -> Result<Self, ConsoleError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let api_url = match (env, env::var("HARBOR_API_URL")) {
            (_, Ok(url)) if !url.trim().is_empty() => url,
            (Env::Production, _) => {
                return Err(ConsoleError::Config(
                    "HARBOR_API_URL must be set in production".to_string(),
                ));
            }
            (Env::Local, _) => DEFAULT_API_URL.to_string(),
        };

        let timeout = match env::var("HARBOR_API_TIMEOUT_MS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_millis(DEFAULT_TIMEOUT_MS),
        };

        let locale = env::var("HARBOR_LOCALE").unwrap_or_else(|_| DEFAULT_LOCALE.to_string());
        let state_dir = env::var("HARBOR_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR));

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            timeout,
            locale,
            state_dir,
            env,
        })
    }

    /// Full base address of the API, e.g. `http://localhost:8080/api/v1`.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.api_url.trim_end_matches('/'), API_PREFIX)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConsoleError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConsoleError::Config(format!(
            "HARBOR_API_TIMEOUT_MS must be a positive integer, got `{raw}`"
        ))),
    }
}
