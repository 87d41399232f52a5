use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use clap::Parser;

use crate::gemini::{DEFAULT_API_BASE, DEFAULT_MODEL};

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

#[derive(Parser, Debug, Clone)]
#[clap(name = "calorie-lens", about = "Estimate the calories of a food photo with Gemini")]
pub struct Opt {
    /// Address to listen on, IPv4 or IPv6.
    #[clap(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub listen_addr: IpAddr,
    #[clap(long, default_value_t = 3000)]
    pub port: u16,
    /// Gemini model used for every generation call.
    #[clap(long, default_value = DEFAULT_MODEL)]
    pub model: String,
    /// Base URL of the Generative Language API.
    #[clap(long, default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

impl Opt {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.listen_addr, self.port)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("GOOGLE_API_KEY must be set in the environment or a .env file")]
    MissingApiKey,
}

/// Reads the API key once, after giving a `.env` file the chance to fill it in.
pub fn load_api_key() -> Result<String, ConfigError> {
    let _ = dotenvy::dotenv();
    api_key_from(std::env::var(API_KEY_VAR).ok())
}

fn api_key_from(value: Option<String>) -> Result<String, ConfigError> {
    match value {
        Some(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(ConfigError::MissingApiKey),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let opt = Opt::parse_from(["calorie-lens"]);
        assert_eq!(opt.socket_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(opt.model, DEFAULT_MODEL);
        assert_eq!(opt.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn flags_override_defaults() {
        let opt = Opt::parse_from([
            "calorie-lens",
            "--listen-addr",
            "127.0.0.1",
            "--port",
            "8080",
            "--model",
            "gemini-1.5-flash",
        ]);
        assert_eq!(opt.socket_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(opt.model, "gemini-1.5-flash");
    }

    #[test]
    fn blank_key_is_missing() {
        assert!(matches!(api_key_from(None), Err(ConfigError::MissingApiKey)));
        assert!(matches!(api_key_from(Some("  ".into())), Err(ConfigError::MissingApiKey)));
        assert_eq!(api_key_from(Some("abc".into())).unwrap(), "abc");
    }
}
