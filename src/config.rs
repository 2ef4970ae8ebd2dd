use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub demo_questions_path: PathBuf,
    pub system_prompt_path: PathBuf,
    pub encryption_key_path: PathBuf,
    pub api_log_path: PathBuf,
    pub api_log_max_entries: usize,
    pub static_dir: PathBuf,
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_address: get_env_or("SERVER_ADDRESS", "0.0.0.0:8111"),
            demo_questions_path: get_env_or("DEMO_QUESTIONS_PATH", "demo_questions.json").into(),
            system_prompt_path: get_env_or("SYSTEM_PROMPT_PATH", "system_prompt.txt").into(),
            encryption_key_path: get_env_or("ENCRYPTION_KEY_PATH", "key.txt").into(),
            api_log_path: get_env_or("API_LOG_PATH", "log/api.log").into(),
            api_log_max_entries: get_env_parse_or("API_LOG_MAX_ENTRIES", 50)?,
            static_dir: get_env_or("STATIC_DIR", "static").into(),
            log_format: match env::var("LOG_FORMAT").ok().as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }
}

fn get_env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
