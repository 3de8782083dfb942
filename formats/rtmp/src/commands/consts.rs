pub mod c2s_command_names {
    pub const CONNECT: &str = "connect";
    pub const CLOSE: &str = "close";
    pub const CREATE_STREAM: &str = "createStream";
    pub const PLAY: &str = "play";
    pub const DELETE_STREAM: &str = "deleteStream";
    pub const CLOSE_STREAM: &str = "closeStream";
    pub const RECEIVE_AUDIO: &str = "receiveAudio";
    pub const RECEIVE_VIDEO: &str = "receiveVideo";
    pub const PUBLISH: &str = "publish";
    pub const SEEK: &str = "seek";
    pub const PAUSE: &str = "pause";
}

pub mod s2c_command_names {
    pub const RESULT: &str = "_result";
    pub const ERROR: &str = "_error";
    pub const ON_STATUS: &str = "onStatus";
}

pub mod publish_types {
    pub const LIVE: &str = "live";
    pub const RECORD: &str = "record";
    pub const APPEND: &str = "append";
}
