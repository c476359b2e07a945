// config.rs - YAML configuration (config.yaml)
//
// credentials:
//   usernames:
//     jsmith:
//       name: John Smith
//       email: jsmith@example.com
//       password: $2b$12$...        # bcrypt hash (plaintext is hashed on load)
// cookie:
//   name: osintwing_auth
//   key: some_signature_key
//   expiry_days: 30
// server:
//   host: 0.0.0.0
//   port: 8501
// workdir: /var/lib/osintwing
// tools:
//   maigret:
//     program: /opt/maigret/bin/maigret
//     extra_args: ["--no-progressbar"]
// whois_server: whois.iana.org
// logging:
//   activity_log: activity.jsonl

use anyhow::{anyhow, Context, Result};
use colored::*;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use crate::tools::ToolId;

pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";
pub const DEFAULT_PORT: u16 = 8501;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub cookie: CookieConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Directory tools run in and where report cleanup happens
    #[serde(default)]
    pub workdir: Option<PathBuf>,
    #[serde(default)]
    pub tools: BTreeMap<String, ToolOverride>,
    #[serde(default)]
    pub whois_server: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default = "default_title")]
    pub title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub usernames: BTreeMap<String, UserEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEntry {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookieConfig {
    #[serde(default = "default_cookie_name")]
    pub name: String,
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_expiry_days")]
    pub expiry_days: u32,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: default_cookie_name(),
            key: String::new(),
            expiry_days: default_expiry_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolOverride {
    #[serde(default)]
    pub program: Option<String>,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// JSONL file receiving one event per invocation step
    #[serde(default)]
    pub activity_log: Option<PathBuf>,
}

fn default_title() -> String {
    "Intelligence Wing".to_string()
}

fn default_cookie_name() -> String {
    "osintwing_auth".to_string()
}

fn default_expiry_days() -> u32 {
    30
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl AppConfig {
    /// Load and prepare a config file; the file must exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(anyhow!(
                "Configuration file '{}' not found. Please create one.",
                path.display()
            ));
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.prepare()?;
        Ok(config)
    }

    /// Load when present, defaults otherwise (one-shot CLI mode)
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = Self::default();
            config.title = default_title();
            Ok(config)
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: AppConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Hash plaintext passwords, fill a missing cookie key and check tool names
    pub fn prepare(&mut self) -> Result<()> {
        for (login, user) in self.credentials.usernames.iter_mut() {
            if !is_bcrypt_hash(&user.password) {
                println!(
                    "{}",
                    format!("[!] Password for '{}' is stored in plaintext; hashing it in memory", login)
                        .yellow()
                );
                user.password = bcrypt::hash(&user.password, bcrypt::DEFAULT_COST)
                    .with_context(|| format!("Failed to hash password for '{}'", login))?;
            }
        }

        if self.cookie.key.trim().is_empty() {
            println!(
                "{}",
                "[!] cookie.key is empty; sessions will not survive a restart".yellow()
            );
            self.cookie.key = generate_random_string(64);
        }

        self.tool_overrides()?;
        Ok(())
    }

    /// Tool overrides keyed by tool id
    pub fn tool_overrides(&self) -> Result<HashMap<ToolId, ToolOverride>> {
        self.tools
            .iter()
            .map(|(name, entry)| {
                let id = name.parse::<ToolId>().map_err(|e| anyhow!(e))?;
                if !id.spec().is_process() {
                    return Err(anyhow!("Tool '{}' is not a command-line tool", name));
                }
                Ok((id, entry.clone()))
            })
            .collect()
    }
}

fn is_bcrypt_hash(value: &str) -> bool {
    value.len() == 60 && (value.starts_with("$2a$") || value.starts_with("$2b$") || value.starts_with("$2y$"))
}

pub fn generate_random_string(length: usize) -> String {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
credentials:
  usernames:
    jsmith:
      name: John Smith
      email: jsmith@example.com
      password: hunter22
cookie:
  name: wing_cookie
  key: signing-key
  expiry_days: 7
tools:
  maigret:
    program: /opt/maigret/bin/maigret
    extra_args: ["--no-progressbar"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        assert_eq!(config.cookie.name, "wing_cookie");
        assert_eq!(config.cookie.expiry_days, 7);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.title, "Intelligence Wing");
        assert_eq!(config.credentials.usernames["jsmith"].name, "John Smith");
    }

    #[test]
    fn test_prepare_hashes_plaintext() {
        let mut config = AppConfig::from_yaml(SAMPLE).unwrap();
        config.prepare().unwrap();
        let stored = &config.credentials.usernames["jsmith"].password;
        assert!(is_bcrypt_hash(stored));
        assert!(bcrypt::verify("hunter22", stored).unwrap());
    }

    #[test]
    fn test_prepare_fills_cookie_key() {
        let mut config = AppConfig::from_yaml("cookie:\n  name: c\n").unwrap();
        config.prepare().unwrap();
        assert_eq!(config.cookie.key.len(), 64);
    }

    #[test]
    fn test_tool_overrides() {
        let config = AppConfig::from_yaml(SAMPLE).unwrap();
        let overrides = config.tool_overrides().unwrap();
        assert_eq!(
            overrides[&ToolId::Maigret].program.as_deref(),
            Some("/opt/maigret/bin/maigret")
        );
    }

    #[test]
    fn test_unknown_or_library_tool_override_rejected() {
        let config = AppConfig::from_yaml("tools:\n  nmap:\n    program: nmap\n").unwrap();
        assert!(config.tool_overrides().is_err());
        let config = AppConfig::from_yaml("tools:\n  whois:\n    program: whois\n").unwrap();
        assert!(config.tool_overrides().is_err());
    }

    #[test]
    fn test_missing_file_message() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(&dir.path().join("config.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found. Please create one."));
    }

    #[test]
    fn test_load_or_default_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_or_default(&dir.path().join("config.yaml")).unwrap();
        assert!(config.credentials.usernames.is_empty());
        assert_eq!(config.title, "Intelligence Wing");
    }
}
