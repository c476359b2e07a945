// whois.rs - WHOIS client (RFC 3912) with IANA referral following
// Flow: whois.iana.org -> registry server -> registrar server (when referred)

use serde_json::{Map, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::error::OsintError;

pub const IANA_SERVER: &str = "whois.iana.org";
pub const WHOIS_PORT: u16 = 43;

// Responses larger than this are truncated; registries answer in a few KB
const MAX_RESPONSE_BYTES: u64 = 512 * 1024;

const NO_MATCH_MARKERS: &[&str] = &[
    "no match for",
    "not found",
    "no data found",
    "no entries found",
    "domain not found",
    "no matching record",
    "status: free",
    "status: available",
];

#[derive(Debug, Clone)]
pub struct WhoisClient {
    root_server: String,
    port: u16,
    // Root answers for the domain itself instead of referring like IANA does
    direct: bool,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self {
            root_server: IANA_SERVER.to_string(),
            port: WHOIS_PORT,
            direct: false,
        }
    }
}

impl WhoisClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Client rooted at another referral server (IANA mirrors, tests)
    pub fn with_root(root_server: impl Into<String>, port: u16) -> Self {
        Self {
            root_server: root_server.into(),
            port,
            direct: false,
        }
    }

    /// Client that asks one registry server directly (`whois_server` in config.yaml)
    pub fn direct(server: impl Into<String>, port: u16) -> Self {
        Self {
            root_server: server.into(),
            port,
            direct: true,
        }
    }

    /// Look up a domain and return its parsed registration record
    pub async fn lookup(&self, input: &str) -> Result<Value, OsintError> {
        let domain = normalize_domain(input)?;

        let (registry, registry_text) = if self.direct {
            let text = self.query(&self.root_server, &domain).await?;
            (self.root_server.clone(), text)
        } else {
            // Without a referral the root only describes the TLD
            let root_text = self.query(&self.root_server, &domain).await?;
            let Some(registry) = find_referral(&root_text) else {
                return Err(no_match(&domain));
            };
            let text = self.query(&registry, &domain).await?;
            (registry, text)
        };

        if is_no_match(&registry_text) {
            return Err(no_match(&domain));
        }

        let mut record = parse_whois(&registry_text);

        // Registrar servers usually carry the registrant contact block
        if let Some(registrar) = find_referral(&registry_text) {
            if !registrar.eq_ignore_ascii_case(&registry) {
                if let Ok(registrar_text) = self.query(&registrar, &domain).await {
                    if !is_no_match(&registrar_text) {
                        for (key, value) in parse_whois(&registrar_text) {
                            record.insert(key, value);
                        }
                    }
                }
            }
        }

        if record.is_empty() {
            return Err(OsintError::Lookup(format!(
                "No registration data for \"{}\".",
                domain
            )));
        }

        Ok(Value::Object(record))
    }

    async fn query(&self, server: &str, domain: &str) -> Result<String, OsintError> {
        let addr = format!("{}:{}", server, self.port);
        let mut stream = TcpStream::connect(&addr)
            .await
            .map_err(|e| OsintError::Transport(format!("Cannot reach {}: {}", addr, e)))?;

        stream
            .write_all(format!("{}\r\n", domain).as_bytes())
            .await
            .map_err(|e| OsintError::Transport(format!("Write to {} failed: {}", addr, e)))?;

        let mut buf = Vec::new();
        (&mut stream)
            .take(MAX_RESPONSE_BYTES)
            .read_to_end(&mut buf)
            .await
            .map_err(|e| OsintError::Transport(format!("Read from {} failed: {}", addr, e)))?;

        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

fn no_match(domain: &str) -> OsintError {
    OsintError::Lookup(format!("No match for \"{}\".", domain))
}

/// Reduce user input such as `https://www.Example.com/path` to `www.example.com`
pub fn normalize_domain(input: &str) -> Result<String, OsintError> {
    let mut domain = input.trim().to_lowercase();

    for scheme in ["http://", "https://"] {
        if let Some(rest) = domain.strip_prefix(scheme) {
            domain = rest.to_string();
        }
    }
    if let Some((host, _)) = domain.split_once('/') {
        domain = host.to_string();
    }
    let domain = domain.trim_end_matches('.').to_string();

    let valid_chars = domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '.');
    if domain.is_empty() || !domain.contains('.') || !valid_chars || domain.starts_with('.') {
        return Err(OsintError::Lookup(format!(
            "\"{}\" is not a valid domain name.",
            input.trim()
        )));
    }

    Ok(domain)
}

/// Next server to ask, from IANA `refer:`/`whois:` or a registry's registrar line
pub fn find_referral(text: &str) -> Option<String> {
    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once(':') else {
            continue;
        };
        let key = key.trim().to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        if matches!(key.as_str(), "refer" | "whois" | "registrar whois server" | "whois server") {
            let server = value
                .trim_start_matches("whois://")
                .trim_start_matches("rwhois://")
                .trim_end_matches('/');
            if !server.is_empty() && !server.contains(' ') {
                return Some(server.to_lowercase());
            }
        }
    }
    None
}

pub fn is_no_match(text: &str) -> bool {
    let lowered = text.to_lowercase();
    NO_MATCH_MARKERS.iter().any(|marker| {
        lowered
            .lines()
            .map(str::trim)
            .any(|line| line.starts_with(marker) || line.starts_with(&format!("% {}", marker)))
    })
}

fn canonical_key(key: &str) -> Option<&'static str> {
    let key = key.trim().to_lowercase();
    let canonical = match key.as_str() {
        "domain name" | "domain" => "domain_name",
        "registrar" | "sponsoring registrar" | "registrar name" => "registrar",
        "registrar whois server" | "whois server" => "whois_server",
        "registrar url" | "referral url" => "referral_url",
        "creation date" | "created" | "created on" | "registered on" | "registration time" => {
            "creation_date"
        }
        "updated date" | "last updated" | "last-update" | "changed" | "last modified" => {
            "updated_date"
        }
        "registry expiry date"
        | "registrar registration expiration date"
        | "expiration date"
        | "expiry date"
        | "expires on"
        | "paid-till" => "expiration_date",
        "name server" | "nserver" | "nameservers" | "name servers" => "name_servers",
        "domain status" | "status" => "status",
        "dnssec" => "dnssec",
        "registrant name" => "name",
        "registrant organization" | "registrant organisation" | "org" | "organisation" => "org",
        "registrant street" => "address",
        "registrant city" => "city",
        "registrant state/province" => "state",
        "registrant postal code" => "registrant_postal_code",
        "registrant country" | "country" => "country",
        k if k.contains("email") || k == "e-mail" => "emails",
        _ => return None,
    };
    Some(canonical)
}

/// Parse `Key: Value` lines into a JSON object; repeated keys become arrays
pub fn parse_whois(text: &str) -> Map<String, Value> {
    let mut collected: Vec<(&'static str, Vec<String>)> = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('%') || line.starts_with('#') || line.starts_with(">>>") {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = canonical_key(key) else {
            continue;
        };
        let mut value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        if field == "name_servers" {
            value = value.to_lowercase();
        }
        if field == "status" {
            // "clientTransferProhibited https://icann.org/epp#..." -> keep the code
            if let Some((code, _)) = value.split_once(' ') {
                value = code.to_string();
            }
        }

        match collected.iter_mut().find(|(k, _)| *k == field) {
            Some((_, values)) => {
                if !values.iter().any(|v| v.eq_ignore_ascii_case(&value)) {
                    values.push(value);
                }
            }
            None => collected.push((field, vec![value])),
        }
    }

    collected
        .into_iter()
        .map(|(key, mut values)| {
            let value = if values.len() == 1 {
                Value::String(values.remove(0))
            } else {
                Value::Array(values.into_iter().map(Value::String).collect())
            };
            (key.to_string(), value)
        })
        .collect()
}
