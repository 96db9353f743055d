use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;

/// Name of the configuration file looked up in the home directory.
const DEFAULT_FILE: &str = ".popdir.conf";

/// The JSON configuration file.
///
/// ```json
/// {
///   "Username": "me@example.com",
///   "Password": "secret",
///   "MaildirPath": "/home/me/Mail",
///   "ServerAddress": "pop.example.com:995",
///   "TLSServerName": "",
///   "ProxyAddress": "127.0.0.1:9050",
///   "DisableTLS": false
/// }
/// ```
#[derive(Clone, Deserialize)]
pub struct Config {
    #[serde(rename = "Username")]
    pub username: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "MaildirPath")]
    pub maildir_path: PathBuf,
    #[serde(rename = "ServerAddress")]
    pub server_address: String,
    #[serde(rename = "TLSServerName", default)]
    tls_server_name: String,
    #[serde(rename = "ProxyAddress", default)]
    proxy_address: String,
    #[serde(rename = "DisableTLS", default)]
    pub disable_tls: bool,
}

// keep the password out of logs and panics
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("username", &self.username)
            .field("maildir_path", &self.maildir_path)
            .field("server_address", &self.server_address)
            .field("tls_server_name", &self.tls_server_name)
            .field("proxy_address", &self.proxy_address)
            .field("disable_tls", &self.disable_tls)
            .finish_non_exhaustive()
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config> {
        let data =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        Config::parse(&data).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Config> {
        let config: Config = serde_json::from_str(data)?;
        config.server()?;
        Ok(config)
    }

    /// Split `ServerAddress` into host and port. IPv6 literals are written `[::1]:995`.
    pub fn server(&self) -> Result<(&str, u16)> {
        let (host, port) = self
            .server_address
            .rsplit_once(':')
            .ok_or_else(|| anyhow!("ServerAddress {:?} has no port", self.server_address))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);
        if host.is_empty() {
            bail!("ServerAddress {:?} has no host", self.server_address);
        }
        let port = port
            .parse()
            .with_context(|| format!("invalid port in ServerAddress {:?}", self.server_address))?;
        Ok((host, port))
    }

    /// The name to check the server certificate against; the server host unless overridden.
    pub fn tls_server_name(&self) -> Option<&str> {
        non_empty(&self.tls_server_name)
    }

    pub fn proxy_address(&self) -> Option<&str> {
        non_empty(&self.proxy_address)
    }
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub fn default_path() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("cannot determine home directory"))?;
    Ok(home.join(DEFAULT_FILE))
}
