pub const MAX_TIMESTAMP: u32 = 0xFFFFFF;
pub const MAX_CHUNK_SIZE: u32 = 0xFFFFFF;
pub const INIT_CHUNK_SIZE: u32 = 128;
pub const DEFAULT_MAX_MESSAGE_SIZE: u32 = 16 * 1024 * 1024;

pub mod csid {
    use crate::{
        protocol_control::consts::PROTOCOL_CONTROL_CSID, user_control::consts::USER_CONTROL_CSID,
    };

    pub const PROTOCOL_CONTROL: u8 = PROTOCOL_CONTROL_CSID;
    pub const USER_CONTROL: u8 = USER_CONTROL_CSID;
    pub const NET_CONNECTION_COMMAND: u8 = 0x03;
    pub const NET_CONNECTION_COMMAND2: u8 = 0x04;
    pub const NET_STREAM_COMMAND: u8 = 0x05;
    pub const VIDEO: u8 = 0x06;
    pub const AUDIO: u8 = 0x07;
}
