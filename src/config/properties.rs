//! Properties-file configuration source
//!
//! The gateway is configured from a Java-style properties file whose values
//! can be overridden by process environment variables. Loading is an explicit
//! ordered merge — file first, environment second — producing one resolved
//! bundle before any validation runs.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::debug;

use super::error::{ConfigError, Result};
use super::AuthMode;

/// Environment variable prefix for all configuration overrides
pub const ENV_PREFIX: &str = "S3_GATEWAY_";

/// Backend provider identifier (e.g. `transient`)
pub const BACKEND_PROVIDER: &str = "backend.provider";
/// Backend account identity
pub const BACKEND_IDENTITY: &str = "backend.identity";
/// Backend account credential
pub const BACKEND_CREDENTIAL: &str = "backend.credential";
/// Optional backend endpoint override URI
pub const BACKEND_ENDPOINT: &str = "backend.endpoint";
/// Gateway listen endpoint URI
pub const GATEWAY_ENDPOINT: &str = "gateway.endpoint";
/// Gateway authorization mode: `aws-v2` or `none`
pub const GATEWAY_AUTHORIZATION: &str = "gateway.authorization";
/// Gateway-local access key identity (required for `aws-v2`)
pub const GATEWAY_IDENTITY: &str = "gateway.identity";
/// Gateway-local secret key (required for `aws-v2`)
pub const GATEWAY_CREDENTIAL: &str = "gateway.credential";
/// Path to the PKCS#12 certificate store
pub const GATEWAY_KEYSTORE_PATH: &str = "gateway.keystore-path";
/// Password for the certificate store
pub const GATEWAY_KEYSTORE_PASSWORD: &str = "gateway.keystore-password";
/// Alternate hostname the gateway recognizes as itself
pub const GATEWAY_VIRTUAL_HOST: &str = "gateway.virtual-host";

/// Keys that must be present after the file/environment merge.
pub const REQUIRED_KEYS: &[&str] = &[
    BACKEND_PROVIDER,
    BACKEND_IDENTITY,
    BACKEND_CREDENTIAL,
    GATEWAY_ENDPOINT,
    GATEWAY_AUTHORIZATION,
];

/// Every key the gateway understands; the environment overlay scans these.
const KNOWN_KEYS: &[&str] = &[
    BACKEND_PROVIDER,
    BACKEND_IDENTITY,
    BACKEND_CREDENTIAL,
    BACKEND_ENDPOINT,
    GATEWAY_ENDPOINT,
    GATEWAY_AUTHORIZATION,
    GATEWAY_IDENTITY,
    GATEWAY_CREDENTIAL,
    GATEWAY_KEYSTORE_PATH,
    GATEWAY_KEYSTORE_PASSWORD,
    GATEWAY_VIRTUAL_HOST,
];

/// Fully resolved configuration bundle consumed by the CLI.
#[derive(Debug, Clone)]
pub struct ResolvedProperties {
    /// Backend provider identifier
    pub provider: String,
    /// Backend account identity
    pub backend_identity: String,
    /// Backend account credential
    pub backend_credential: String,
    /// Optional backend endpoint override
    pub backend_endpoint: Option<String>,
    /// Gateway listen endpoint URI
    pub endpoint: String,
    /// Gateway authorization mode
    pub authorization: AuthMode,
    /// Gateway-local identity, present iff authorization is `aws-v2`
    pub gateway_identity: Option<String>,
    /// Gateway-local credential, present iff authorization is `aws-v2`
    pub gateway_credential: Option<String>,
    /// Certificate store path
    pub keystore_path: Option<String>,
    /// Certificate store password
    pub keystore_password: Option<String>,
    /// Virtual host name
    pub virtual_host: Option<String>,
}

/// Load a properties file into a key/value map.
///
/// Supports the `key=value` and `key: value` forms; blank lines and lines
/// starting with `#` or `!` are ignored.
pub fn load_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::FileRead(path.to_path_buf(), e.to_string()))?;

    let mut map = HashMap::new();
    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some((key, value)) = line.split_once(['=', ':']) else {
            return Err(ConfigError::FileRead(
                path.to_path_buf(),
                format!("malformed property line: {}", line),
            ));
        };
        map.insert(key.trim().to_string(), value.trim().to_string());
    }

    Ok(map)
}

/// Environment variable name for a property key.
///
/// `gateway.keystore-path` becomes `S3_GATEWAY_GATEWAY_KEYSTORE_PATH`.
pub fn env_key(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    for c in key.chars() {
        match c {
            '.' | '-' => name.push('_'),
            c => name.push(c.to_ascii_uppercase()),
        }
    }
    name
}

/// Overlay environment variables onto file-loaded properties.
///
/// Only known keys are scanned; an environment value always wins over the
/// file value for the same key.
pub fn apply_env_overrides(map: &mut HashMap<String, String>) {
    for key in KNOWN_KEYS {
        if let Ok(value) = env::var(env_key(key)) {
            debug!("environment override for {}", key);
            map.insert((*key).to_string(), value);
        }
    }
}

/// Load, overlay, and resolve the configuration bundle.
///
/// Fails when a required key is missing (the error lists every required
/// key), when the authorization mode is unrecognized, or when only half of
/// a paired option (gateway credentials, certificate store) is present.
pub fn resolve(path: &Path) -> Result<ResolvedProperties> {
    let mut map = load_file(path)?;
    apply_env_overrides(&mut map);

    if REQUIRED_KEYS.iter().any(|key| !map.contains_key(*key)) {
        return Err(ConfigError::MissingProperties(REQUIRED_KEYS.join("\n")));
    }

    let authorization = AuthMode::from_str(&map[GATEWAY_AUTHORIZATION])?;

    let gateway_identity = map.get(GATEWAY_IDENTITY).cloned();
    let gateway_credential = map.get(GATEWAY_CREDENTIAL).cloned();
    if authorization == AuthMode::AwsV2
        && (gateway_identity.is_none() || gateway_credential.is_none())
    {
        return Err(ConfigError::MissingRequiredValue(format!(
            "{} and {} (required when {} is aws-v2)",
            GATEWAY_IDENTITY, GATEWAY_CREDENTIAL, GATEWAY_AUTHORIZATION
        )));
    }

    let keystore_path = map.get(GATEWAY_KEYSTORE_PATH).cloned();
    let keystore_password = map.get(GATEWAY_KEYSTORE_PASSWORD).cloned();
    if keystore_path.is_some() != keystore_password.is_some() {
        return Err(ConfigError::MissingRequiredValue(format!(
            "{} and {} must be provided together",
            GATEWAY_KEYSTORE_PATH, GATEWAY_KEYSTORE_PASSWORD
        )));
    }

    Ok(ResolvedProperties {
        provider: map[BACKEND_PROVIDER].clone(),
        backend_identity: map[BACKEND_IDENTITY].clone(),
        backend_credential: map[BACKEND_CREDENTIAL].clone(),
        backend_endpoint: map.get(BACKEND_ENDPOINT).cloned(),
        endpoint: map[GATEWAY_ENDPOINT].clone(),
        authorization,
        gateway_identity,
        gateway_credential,
        keystore_path,
        keystore_password,
        virtual_host: map.get(GATEWAY_VIRTUAL_HOST).cloned(),
    })
}
