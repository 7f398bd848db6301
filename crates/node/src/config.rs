//! Node configuration and its defaults.
//!
//! | option           | default |
//! |------------------|---------|
//! | `joinTimeout`    | 5000 ms |
//! | `pingTimeout`    | 200 ms  |
//! | `pingReqTimeout` | 600 ms  |
//! | `interval`       | 200 ms  |
//! | `local.host`     | none    |
//! | `host`           | none (detected address) |
//! | `port`           | none (ephemeral UDP port) |
//! | `base`           | empty   |
//! | `http`           | none (no control plane) |
//!
//! Every field defaults on its own, so a config naming only `local` keeps the
//! default `base` and the other way around.

use crate::error::{Error, Result};

use std::path::Path;
use std::time::Duration;

use baseswim_membership::JoinOptions;
use serde::Deserialize;

/// Default `joinTimeout` in milliseconds.
pub const DEFAULT_JOIN_TIMEOUT_MS: u64 = 5000;

/// Default `pingTimeout` in milliseconds, ten times the gossip library's own.
pub const DEFAULT_PING_TIMEOUT_MS: u64 = 200;

/// Default `pingReqTimeout` in milliseconds, ten times the gossip library's own.
pub const DEFAULT_PING_REQ_TIMEOUT_MS: u64 = 600;

/// Default protocol `interval` in milliseconds.
pub const DEFAULT_INTERVAL_MS: u64 = 200;

/// Port the control plane binds when `http` does not name one.
pub const DEFAULT_CONTROL_PLANE_PORT: u16 = 3000;

/// Explicit identity settings.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocalConfig {
    /// The `host:port` to advertise, used verbatim when set.
    pub host: Option<String>,
}

/// The `http` option: a flag, a bare port, or `{ port = .. }`.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum HttpSetting {
    /// `http = true` starts the control plane on the default port.
    Enabled(bool),

    /// `http = 8080` is shorthand for `{ port = 8080 }`.
    Port(u16),

    /// `http = { port = 8080 }`.
    Options {
        /// Port to bind, the default when absent.
        #[serde(default)]
        port: Option<u16>,
    },
}

/// Normalized control plane settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlPlaneConfig {
    /// Port to bind.
    pub port: u16,
}

/// Configuration of a node, read-only once the node is created.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct NodeConfig {
    /// Give up joining after this many milliseconds.
    #[serde(rename = "joinTimeout")]
    pub join_timeout_ms: u64,

    /// Direct probe timeout in milliseconds.
    #[serde(rename = "pingTimeout")]
    pub ping_timeout_ms: u64,

    /// Indirect probe timeout in milliseconds.
    #[serde(rename = "pingReqTimeout")]
    pub ping_req_timeout_ms: u64,

    /// Protocol period in milliseconds.
    #[serde(rename = "interval")]
    pub interval_ms: u64,

    /// Explicit identity.
    pub local: LocalConfig,

    /// Hostname to advertise instead of the detected address.
    pub host: Option<String>,

    /// Gossip port.
    pub port: Option<u16>,

    /// Seed addresses.
    pub base: Vec<String>,

    /// Control plane activation.
    pub http: Option<HttpSetting>,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            join_timeout_ms: DEFAULT_JOIN_TIMEOUT_MS,
            ping_timeout_ms: DEFAULT_PING_TIMEOUT_MS,
            ping_req_timeout_ms: DEFAULT_PING_REQ_TIMEOUT_MS,
            interval_ms: DEFAULT_INTERVAL_MS,
            local: LocalConfig::default(),
            host: None,
            port: None,
            base: Vec::new(),
            http: None,
        }
    }
}

impl NodeConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the document is not valid TOML or has
    /// options of the wrong type.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|e| Error::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        Self::from_toml_str(&source)
    }

    /// Uses `id` as the identity unless `local.host` is already set.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        if self.local_host().is_none() {
            self.local.host = Some(id.into());
        }
        self
    }

    /// The explicit identity, if any. Blank counts as unset.
    #[must_use]
    pub fn local_host(&self) -> Option<&str> {
        self.local.host.as_deref().filter(|host| !host.trim().is_empty())
    }

    /// The hostname override, if any. Blank counts as unset.
    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.host.as_deref().filter(|host| !host.trim().is_empty())
    }

    /// The configured gossip port; zero counts as unset.
    #[must_use]
    pub fn gossip_port(&self) -> Option<u16> {
        self.port.filter(|port| *port != 0)
    }

    /// Join timeout.
    #[must_use]
    pub const fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }

    /// Whether a control plane was requested, and on which port.
    ///
    /// `false` and `0` disable it; `true`, `{}` and `{ port = 0 }` use
    /// [`DEFAULT_CONTROL_PLANE_PORT`].
    #[must_use]
    pub fn control_plane(&self) -> Option<ControlPlaneConfig> {
        let port = match self.http.as_ref()? {
            HttpSetting::Enabled(false) | HttpSetting::Port(0) => return None,
            HttpSetting::Enabled(true) => DEFAULT_CONTROL_PLANE_PORT,
            HttpSetting::Port(port) => *port,
            HttpSetting::Options { port } => port
                .filter(|port| *port != 0)
                .unwrap_or(DEFAULT_CONTROL_PLANE_PORT),
        };

        Some(ControlPlaneConfig { port })
    }

    /// Options handed to the membership provider once `local_host` is known.
    #[must_use]
    pub fn join_options(&self, local_host: impl Into<String>) -> JoinOptions {
        JoinOptions {
            local_host: local_host.into(),
            seeds: self.base.clone(),
            join_timeout: self.join_timeout(),
            ping_timeout: Duration::from_millis(self.ping_timeout_ms),
            ping_req_timeout: Duration::from_millis(self.ping_req_timeout_ms),
            interval: Duration::from_millis(self.interval_ms),
        }
    }
}
