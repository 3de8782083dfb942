use std::collections::HashMap;

use crate::chunk::errors::ChunkMessageError;

pub mod consts;
pub mod reader;
pub mod writer;

///! @see: 7.2.1.1. connect
/// Real-world encoders omit most of the documented command object fields,
/// so everything except `app` is optional with protocol defaults.
#[derive(Debug, Clone, Default)]
pub struct ConnectCommandObject {
    pub app: String,
    pub tc_url: String,
    pub flash_version: Option<String>,
    pub swf_url: Option<String>,
    pub page_url: Option<String>,
    pub object_encoding: u8,
}

impl TryFrom<HashMap<String, amf::Value>> for ConnectCommandObject {
    type Error = ChunkMessageError;
    fn try_from(value: HashMap<String, amf::Value>) -> Result<Self, Self::Error> {
        let string_field = |key: &str| {
            value
                .get(key)
                .and_then(|v| v.try_as_str())
                .map(|v| v.to_string())
        };
        let number_field = |key: &str| value.get(key).and_then(|v| v.try_as_f64());

        let object_encoding = number_field("objectEncoding").unwrap_or(0.0) as u8;
        if object_encoding != 0 && object_encoding != 3 {
            return Err(ChunkMessageError::UnexpectedAmfType(format!(
                "objectEncoding should be 0 or 3, got {}",
                object_encoding
            )));
        }

        Ok(ConnectCommandObject {
            app: string_field("app").unwrap_or_default(),
            tc_url: string_field("tcUrl").unwrap_or_default(),
            flash_version: string_field("flashver"),
            swf_url: string_field("swfUrl"),
            page_url: string_field("pageUrl"),
            object_encoding,
        })
    }
}

#[derive(Debug)]
pub struct ConnectCommandRequest {
    pub transaction_id: f64, // always 1
    pub command_object: ConnectCommandObject,
    pub optional_user_arguments: Option<HashMap<String, amf::Value>>,
}

#[derive(Debug)]
pub struct ConnectCommandResponse {
    /// `_result` on success, `_error` otherwise.
    pub success: bool,
    pub transaction_id: f64,
    pub properties: Vec<(String, amf::Value)>,
    pub information: Vec<(String, amf::Value)>,
}

#[derive(Debug)]
pub struct CallCommandRequest {
    pub procedure_name: String,
    pub transaction_id: f64,
    pub command_object: Option<HashMap<String, amf::Value>>,
    pub optional_arguments: Option<amf::Value>,
}

#[derive(Debug)]
pub struct CallCommandResponse {
    pub success: bool,
    pub transaction_id: f64,
}

#[derive(Debug)]
pub struct CreateStreamCommandRequest {
    pub transaction_id: f64,
    pub command_object: Option<HashMap<String, amf::Value>>,
}

#[derive(Debug)]
pub struct CreateStreamCommandResponse {
    pub success: bool,
    pub transaction_id: f64,
    pub stream_id: f64,
}

#[derive(Debug)]
pub struct OnStatusCommand {
    pub transaction_id: f64, // always 0
    // command object is null
    pub info_object: Vec<(String, amf::Value)>,
}

#[derive(Debug)]
pub struct PlayCommand {
    pub transaction_id: f64,
    // command object is null
    pub stream_name: String,
    pub start: f64,    // default -2
    pub duration: f64, // default -1
    pub reset: bool,
}

#[derive(Debug)]
pub struct DeleteStreamCommand {
    pub transaction_id: f64,
    // command object is null
    pub stream_id: f64,
}

#[derive(Debug)]
pub struct CloseStreamCommand {
    pub transaction_id: f64,
}

#[derive(Debug)]
pub struct ReceiveAudioCommand {
    pub transaction_id: f64,
    // command object is null
    pub flag: bool,
}

#[derive(Debug)]
pub struct ReceiveVideoCommand {
    pub transaction_id: f64,
    // command object is null
    pub flag: bool,
}

#[derive(Debug)]
pub struct PublishCommand {
    pub transaction_id: f64,
    // command object is null
    pub publishing_name: String,
    /// "live", "record" or "append"
    pub publishing_type: String,
}

#[derive(Debug)]
pub struct SeekCommand {
    pub transaction_id: f64,
    pub milliseconds: f64,
}

#[derive(Debug)]
pub struct PauseCommand {
    pub transaction_id: f64,
    pub pause: bool,
    pub milliseconds: f64,
}

#[derive(Debug)]
pub enum RtmpC2SCommands {
    Connect(ConnectCommandRequest),
    Call(CallCommandRequest),
    CreateStream(CreateStreamCommandRequest),
    Play(PlayCommand),
    DeleteStream(DeleteStreamCommand),
    CloseStream(CloseStreamCommand),
    ReceiveAudio(ReceiveAudioCommand),
    ReceiveVideo(ReceiveVideoCommand),
    Publish(PublishCommand),
    Seek(SeekCommand),
    Pause(PauseCommand),
}

#[derive(Debug)]
pub enum RtmpS2CCommands {
    Connect(ConnectCommandResponse),
    Call(CallCommandResponse),
    CreateStream(CreateStreamCommandResponse),
    OnStatus(OnStatusCommand),
}
