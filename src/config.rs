use std::{
    env,
    fmt::{Debug, Display},
    path::PathBuf,
    str::FromStr,
};

use log::{info, warn};

/// Settings of the development backend, read from the environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Directory served as static files (HTML, scripts, uploads)
    pub public_dir: PathBuf,
    /// JSON file holding the article rows
    pub articles_file: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        Config::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset or invalid keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            host: try_load(&lookup, "HOST", "127.0.0.1".to_string()),
            port: try_load(&lookup, "PORT", 3000),
            public_dir: try_load(&lookup, "PUBLIC_DIR", PathBuf::from("public")),
            articles_file: try_load(
                &lookup,
                "ARTICLES_FILE",
                PathBuf::from("database/articles.json"),
            ),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Origins allowed to make credentialed cross-origin requests
    pub fn allowed_origins(&self) -> Vec<String> {
        vec![
            format!("http://localhost:{}", self.port),
            format!("http://127.0.0.1:{}", self.port),
        ]
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + Debug,
    T::Err: Display,
{
    let Some(raw) = lookup(key) else {
        info!("{key} not set, using default: {default:?}");
        return default;
    };

    raw.parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default:?}");
        default
    })
}
