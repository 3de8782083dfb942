use std::{env, net::IpAddr};

use config::{Config, Environment, File};
use rtmp_ingress::config::RtmpServerConfig;
use serde::Deserialize;

use crate::{AppCli, errors::AppResult, util::parse_log_level};

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct Logger {
    pub(crate) level: String,
}

impl Default for Logger {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub(crate) struct RtmpServer {
    pub(crate) enable: bool,
    pub(crate) address: IpAddr,
    pub(crate) port: u16,
    pub(crate) chunk_size: u32,
    pub(crate) window_ack_size: u32,
    pub(crate) peer_bandwidth: u32,
    pub(crate) read_timeout_ms: u64,
    pub(crate) write_timeout_ms: u64,
    pub(crate) publish_idle_timeout_ms: u64,
    pub(crate) max_message_size: u32,
}

impl Default for RtmpServer {
    fn default() -> Self {
        let defaults = RtmpServerConfig::default();
        Self {
            enable: true,
            address: defaults.address,
            port: defaults.port,
            chunk_size: defaults.chunk_size,
            window_ack_size: defaults.window_ack_size,
            peer_bandwidth: defaults.peer_bandwidth,
            read_timeout_ms: defaults.read_timeout_ms,
            write_timeout_ms: defaults.write_timeout_ms,
            publish_idle_timeout_ms: defaults.publish_idle_timeout_ms,
            max_message_size: defaults.max_message_size,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    pub(crate) logger: Logger,
    pub(crate) rtmp_server: RtmpServer,
}

impl AppConfig {
    /// Loads the config file named on the command line (or `RILL_CONFIG`),
    /// with `RILL_*` environment variables overriding file values. No file
    /// at all means built-in defaults.
    pub(crate) fn new(config_path: Option<String>) -> AppResult<Self> {
        let config_path = config_path.or_else(|| env::var("RILL_CONFIG").ok());
        let mut builder = Config::builder();
        if let Some(path) = &config_path {
            builder = builder.add_source(File::with_name(path));
        }
        let result = builder
            .add_source(Environment::with_prefix("rill").separator("__"))
            .build()?;
        let config = result.try_deserialize()?;
        Ok(config)
    }

    pub(crate) fn apply(&mut self, cli_args: &AppCli) {
        if let Some(level) = &cli_args.log_level {
            self.logger.level = level.clone();
        }
        if let Some(port) = cli_args.rtmp_port {
            self.rtmp_server.port = port;
        }
    }

    pub(crate) fn validate(&self) -> AppResult<()> {
        let _ = parse_log_level(&self.logger.level)?;
        Ok(())
    }

    pub(crate) fn rtmp_server_config(&self) -> RtmpServerConfig {
        RtmpServerConfig {
            address: self.rtmp_server.address,
            port: self.rtmp_server.port,
            chunk_size: self.rtmp_server.chunk_size.max(128),
            window_ack_size: self.rtmp_server.window_ack_size,
            peer_bandwidth: self.rtmp_server.peer_bandwidth,
            read_timeout_ms: self.rtmp_server.read_timeout_ms,
            write_timeout_ms: self.rtmp_server.write_timeout_ms,
            publish_idle_timeout_ms: self.rtmp_server.publish_idle_timeout_ms,
            max_message_size: self.rtmp_server.max_message_size,
        }
    }
}
