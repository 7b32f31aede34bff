use crate::error::ConfigError;
use alloy::primitives::Address;
use std::env;
use std::str::FromStr;

const DEFAULT_DB_PATH: &str = "antibot.db";
const DEFAULT_POLL_INTERVAL_MS: u64 = 12_000;
const MIN_POLL_INTERVAL_MS: u64 = 1_000;
const MAX_POLL_INTERVAL_MS: u64 = 300_000;
const DEFAULT_LOG_CHUNK_BLOCKS: u64 = 2_000;
const MIN_LOG_CHUNK_BLOCKS: u64 = 50;
const MAX_LOG_CHUNK_BLOCKS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub eth_rpc_url: String,
    pub antibot_address: Address,
    pub db_path: String,
    pub start_block: u64,
    pub poll_interval_ms: u64,
    pub log_chunk_blocks: u64,
}

fn validate_http_url(name: &str, raw: &str) -> Result<(), ConfigError> {
    let parsed = raw.parse::<reqwest::Url>().map_err(|e| {
        ConfigError::Invalid(format!("{name} must be a valid URL, got `{raw}`: {e}"))
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::Invalid(format!(
            "{name} must use http(s) scheme, got `{other}`"
        ))),
    }
}

fn clamp_parse_u64(raw: Option<&str>, min: u64, max: u64, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .map(|v| v.clamp(min, max))
        .unwrap_or(default)
}

fn clamped_env_u64(var: &str, min: u64, max: u64, default: u64) -> u64 {
    let raw = env::var(var).ok();
    clamp_parse_u64(raw.as_deref(), min, max, default)
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let eth_rpc_url = env::var("ETH_RPC_URL")
            .map_err(|_| ConfigError::Missing("ETH_RPC_URL must be set".to_string()))?;
        validate_http_url("ETH_RPC_URL", &eth_rpc_url)?;

        let antibot_address_raw = env::var("ANTIBOT_ADDRESS")
            .map_err(|_| ConfigError::Missing("ANTIBOT_ADDRESS must be set".to_string()))?;
        let antibot_address = Address::from_str(antibot_address_raw.trim()).map_err(|e| {
            ConfigError::Invalid(format!(
                "ANTIBOT_ADDRESS must be a 20-byte hex address, got `{antibot_address_raw}`: {e}"
            ))
        })?;

        let db_path = env::var("ANTIBOT_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

        let start_block = match env::var("START_BLOCK") {
            Ok(raw) => raw.trim().parse::<u64>().map_err(|_| {
                ConfigError::Invalid(format!("START_BLOCK must be a valid u64, got `{raw}`"))
            })?,
            Err(_) => 0,
        };

        Ok(Self {
            eth_rpc_url,
            antibot_address,
            db_path,
            start_block,
            poll_interval_ms: clamped_env_u64(
                "POLL_INTERVAL_MS",
                MIN_POLL_INTERVAL_MS,
                MAX_POLL_INTERVAL_MS,
                DEFAULT_POLL_INTERVAL_MS,
            ),
            log_chunk_blocks: clamped_env_u64(
                "LOG_CHUNK_BLOCKS",
                MIN_LOG_CHUNK_BLOCKS,
                MAX_LOG_CHUNK_BLOCKS,
                DEFAULT_LOG_CHUNK_BLOCKS,
            ),
        })
    }
}
