pub const PROTOCOL_CONTROL_CSID: u8 = 0x02;
pub const PROTOCOL_CONTROL_MESSAGE_STREAM_ID: u8 = 0;
