pub const RTMP_HANDSHAKE_SIZE: usize = 1536;
pub const RTMP_HANDSHAKE_RANDOM_SIZE: usize = 1528;
