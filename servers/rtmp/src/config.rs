use std::net::{IpAddr, Ipv4Addr};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RtmpServerConfig {
    pub address: IpAddr,
    pub port: u16,
    /// Outbound chunk size announced right after the handshake; at least
    /// the protocol minimum of 128.
    pub chunk_size: u32,
    pub window_ack_size: u32,
    pub peer_bandwidth: u32,
    /// 0 disables the read timeout.
    pub read_timeout_ms: u64,
    /// 0 disables the write timeout.
    pub write_timeout_ms: u64,
    /// Grace period after which a publisher that stopped sending data is
    /// reaped; 0 keeps idle publishers forever.
    pub publish_idle_timeout_ms: u64,
    pub max_message_size: u32,
}

impl Default for RtmpServerConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 1935,
            chunk_size: 4096,
            window_ack_size: 2_500_000,
            peer_bandwidth: 2_500_000,
            read_timeout_ms: 0,
            write_timeout_ms: 10_000,
            publish_idle_timeout_ms: 0,
            max_message_size: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct RtmpSessionConfig {
    pub chunk_size: u32,
    pub window_ack_size: u32,
    pub peer_bandwidth: u32,
    pub read_timeout_ms: u64,
    pub write_timeout_ms: u64,
    pub publish_idle_timeout_ms: u64,
    pub max_message_size: u32,
}

impl From<&RtmpServerConfig> for RtmpSessionConfig {
    fn from(config: &RtmpServerConfig) -> Self {
        Self {
            chunk_size: config.chunk_size.max(128),
            window_ack_size: config.window_ack_size,
            peer_bandwidth: config.peer_bandwidth,
            read_timeout_ms: config.read_timeout_ms,
            write_timeout_ms: config.write_timeout_ms,
            publish_idle_timeout_ms: config.publish_idle_timeout_ms,
            max_message_size: config.max_message_size,
        }
    }
}
