use crate::error::Result;

use std::path::PathBuf;

use baseswim::{HttpSetting, NodeConfig};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None, disable_help_flag = true)]
pub struct Args {
    /// Gossip port
    #[arg(short, long, env = "SWIM_PORT")]
    pub port: Option<u16>,

    /// Hostname or IP to advertise
    #[arg(short = 'h', long)]
    pub host: Option<String>,

    /// Give up joining after this many milliseconds
    #[arg(short = 'j', long = "joinTimeout")]
    pub join_timeout: Option<u64>,

    /// Serve the control plane on this port
    #[arg(long)]
    pub http: Option<u16>,

    /// TOML config file, overridden by command-line values
    #[arg(short = 'c', long, env = "SWIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print usage and exit
    #[arg(short = 'H', long)]
    pub help: bool,

    /// Seed addresses; only this member's own address is reachable from the
    /// in-process cluster
    pub base: Vec<String>,
}

impl Args {
    /// Builds the node config: the config file, if any, then flags on top.
    pub fn node_config(&self) -> Result<NodeConfig> {
        let mut config = match &self.config {
            Some(path) => NodeConfig::load(path)?,
            None => NodeConfig::default(),
        };

        if let Some(port) = self.port {
            config.port = Some(port);
        }
        if let Some(host) = &self.host {
            config.host = Some(host.clone());
        }
        if let Some(join_timeout) = self.join_timeout {
            config.join_timeout_ms = join_timeout;
        }
        if let Some(http) = self.http {
            config.http = Some(HttpSetting::Port(http));
        }
        if !self.base.is_empty() {
            config.base.clone_from(&self.base);
        }

        Ok(config)
    }
}

pub fn usage(bin: &str) -> String {
    format!(
        "Usage: {bin} [--port PORT] [--host YOURIP] base1 base2\n\n\
         Members live in an in-memory cluster private to this process, so \
         the only seed that can be reached is this member's own address."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use baseswim::ControlPlaneConfig;

    #[test]
    fn test_flags_and_seeds() {
        let args = Args::try_parse_from([
            "baseswim",
            "-p",
            "9000",
            "-h",
            "10.0.0.5",
            "--joinTimeout",
            "1500",
            "--http",
            "8080",
            "10.0.0.1:9000",
            "10.0.0.2:9000",
        ])
        .unwrap();

        let config = args.node_config().unwrap();
        assert_eq!(config.gossip_port(), Some(9000));
        assert_eq!(config.hostname(), Some("10.0.0.5"));
        assert_eq!(config.join_timeout_ms, 1500);
        assert_eq!(config.control_plane(), Some(ControlPlaneConfig { port: 8080 }));
        assert_eq!(
            config.base,
            vec!["10.0.0.1:9000".to_string(), "10.0.0.2:9000".to_string()]
        );
    }

    #[test]
    fn test_short_help_flag() {
        let args = Args::try_parse_from(["baseswim", "-H"]).unwrap();
        assert!(args.help);

        let text = usage("baseswim");
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Usage: baseswim [--port PORT] [--host YOURIP] base1 base2")
        );
        assert!(text.contains("in-memory cluster private to this process"));
    }

    #[test]
    fn test_missing_config_file() {
        let args = Args::try_parse_from(["baseswim", "-c", "/nonexistent/baseswim.toml"]).unwrap();
        assert!(args.node_config().is_err());
    }
}
