use std::{collections::HashMap, io};

use amf::amf0::Value as Amf0Value;

use crate::chunk::errors::{ChunkMessageError, ChunkMessageResult};

use super::{
    CallCommandRequest, CloseStreamCommand, ConnectCommandObject, ConnectCommandRequest,
    CreateStreamCommandRequest, DeleteStreamCommand, PauseCommand, PlayCommand, PublishCommand,
    ReceiveAudioCommand, ReceiveVideoCommand, RtmpC2SCommands, SeekCommand,
    consts::{c2s_command_names, publish_types},
};

/// Decodes client-to-server commands: a command name string, a transaction
/// id number, and command-specific values, all AMF0. The message layer has
/// already stripped the AMF3 format-switch byte if there was one.
#[derive(Debug)]
pub struct Reader<R> {
    inner: amf::amf0::Reader<R>,
}

impl<R> Reader<R>
where
    R: io::Read,
{
    pub fn new(inner: R) -> Self {
        Self {
            inner: amf::amf0::Reader::new(inner),
        }
    }

    pub fn read_c2s_command(&mut self) -> ChunkMessageResult<RtmpC2SCommands> {
        let command_name = self.read_amf_string()?;

        match command_name.as_str() {
            c2s_command_names::CONNECT => {
                Ok(RtmpC2SCommands::Connect(self.read_connect_command()?))
            }
            c2s_command_names::CREATE_STREAM => Ok(RtmpC2SCommands::CreateStream(
                self.read_create_stream_command()?,
            )),
            c2s_command_names::PLAY => Ok(RtmpC2SCommands::Play(self.read_play_command()?)),
            c2s_command_names::DELETE_STREAM => Ok(RtmpC2SCommands::DeleteStream(
                self.read_delete_stream_command()?,
            )),
            c2s_command_names::CLOSE_STREAM | c2s_command_names::CLOSE => Ok(
                RtmpC2SCommands::CloseStream(self.read_close_stream_command()?),
            ),
            c2s_command_names::RECEIVE_AUDIO => Ok(RtmpC2SCommands::ReceiveAudio(
                self.read_receive_audio_command()?,
            )),
            c2s_command_names::RECEIVE_VIDEO => Ok(RtmpC2SCommands::ReceiveVideo(
                self.read_receive_video_command()?,
            )),
            c2s_command_names::PUBLISH => {
                Ok(RtmpC2SCommands::Publish(self.read_publish_command()?))
            }
            c2s_command_names::SEEK => Ok(RtmpC2SCommands::Seek(self.read_seek_command()?)),
            c2s_command_names::PAUSE => Ok(RtmpC2SCommands::Pause(self.read_pause_command()?)),
            procedure_name => Ok(RtmpC2SCommands::Call(
                self.read_call_command(procedure_name.to_string())?,
            )),
        }
    }

    fn read_connect_command(&mut self) -> ChunkMessageResult<ConnectCommandRequest> {
        let transaction_id = self.read_amf_number()?;
        if transaction_id != 1.0 {
            tracing::warn!(
                "connect transaction_id should be 1, got {} instead",
                transaction_id
            );
        }
        let command_object_map = self.read_amf_object()?.ok_or_else(|| {
            ChunkMessageError::UnexpectedAmfType(
                "connect requires a command object, got a null".to_string(),
            )
        })?;
        let command_object: ConnectCommandObject = command_object_map.try_into()?;
        let optional_user_arguments = self.read_amf_object()?;

        Ok(ConnectCommandRequest {
            transaction_id,
            command_object,
            optional_user_arguments,
        })
    }

    fn read_call_command(
        &mut self,
        procedure_name: String,
    ) -> ChunkMessageResult<CallCommandRequest> {
        let transaction_id = self.read_amf_number()?;
        let command_object = self.read_amf_object()?;
        let optional_arguments = self.read_amf_any()?;
        Ok(CallCommandRequest {
            procedure_name,
            transaction_id,
            command_object,
            optional_arguments,
        })
    }

    fn read_create_stream_command(&mut self) -> ChunkMessageResult<CreateStreamCommandRequest> {
        let transaction_id = self.read_amf_number()?;
        let command_object = self.read_amf_object()?;
        Ok(CreateStreamCommandRequest {
            transaction_id,
            command_object,
        })
    }

    fn read_play_command(&mut self) -> ChunkMessageResult<PlayCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let stream_name = self.read_amf_string()?;
        // start, duration and reset are optional trailing arguments
        let start = self.read_optional_number()?.unwrap_or(-2.0);
        let duration = self.read_optional_number()?.unwrap_or(-1.0);
        let reset = self.read_optional_bool()?.unwrap_or(false);
        Ok(PlayCommand {
            transaction_id,
            stream_name,
            start,
            duration,
            reset,
        })
    }

    fn read_delete_stream_command(&mut self) -> ChunkMessageResult<DeleteStreamCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let stream_id = self.read_amf_number()?;
        Ok(DeleteStreamCommand {
            transaction_id,
            stream_id,
        })
    }

    fn read_close_stream_command(&mut self) -> ChunkMessageResult<CloseStreamCommand> {
        let transaction_id = self.read_amf_number()?;
        Ok(CloseStreamCommand { transaction_id })
    }

    fn read_receive_audio_command(&mut self) -> ChunkMessageResult<ReceiveAudioCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let flag = self.read_amf_bool()?;
        Ok(ReceiveAudioCommand {
            transaction_id,
            flag,
        })
    }

    fn read_receive_video_command(&mut self) -> ChunkMessageResult<ReceiveVideoCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let flag = self.read_amf_bool()?;
        Ok(ReceiveVideoCommand {
            transaction_id,
            flag,
        })
    }

    fn read_publish_command(&mut self) -> ChunkMessageResult<PublishCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let publishing_name = self.read_amf_string()?;
        let publishing_type = self.read_amf_string()?;
        if publishing_type != publish_types::LIVE
            && publishing_type != publish_types::RECORD
            && publishing_type != publish_types::APPEND
        {
            return Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect publish type to be live, record or append, got {}",
                publishing_type
            )));
        }

        Ok(PublishCommand {
            transaction_id,
            publishing_name,
            publishing_type,
        })
    }

    fn read_seek_command(&mut self) -> ChunkMessageResult<SeekCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let milliseconds = self.read_amf_number()?;
        Ok(SeekCommand {
            transaction_id,
            milliseconds,
        })
    }

    fn read_pause_command(&mut self) -> ChunkMessageResult<PauseCommand> {
        let transaction_id = self.read_amf_number()?;
        self.read_amf_null()?;
        let pause = self.read_amf_bool()?;
        let milliseconds = self.read_amf_number()?;
        Ok(PauseCommand {
            transaction_id,
            pause,
            milliseconds,
        })
    }

    fn read_amf_null(&mut self) -> ChunkMessageResult<()> {
        match self.inner.read()? {
            Some(Amf0Value::Null) | Some(Amf0Value::Undefined) => Ok(()),
            None => Err(ChunkMessageError::UnexpectedAmfType(
                "expect a null, got end of payload".to_string(),
            )),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a null, got a {:?}",
                value
            ))),
        }
    }

    fn read_amf_string(&mut self) -> ChunkMessageResult<String> {
        match self.inner.read()? {
            Some(Amf0Value::String(s)) => Ok(s),
            None => Err(ChunkMessageError::UnexpectedAmfType(
                "expect a string, got end of payload".to_string(),
            )),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a string, got a {:?}",
                value
            ))),
        }
    }

    fn read_amf_number(&mut self) -> ChunkMessageResult<f64> {
        match self.inner.read()? {
            Some(Amf0Value::Number(n)) => Ok(n),
            None => Err(ChunkMessageError::UnexpectedAmfType(
                "expect a number, got end of payload".to_string(),
            )),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a number, got a {:?}",
                value
            ))),
        }
    }

    fn read_amf_bool(&mut self) -> ChunkMessageResult<bool> {
        match self.inner.read()? {
            Some(Amf0Value::Boolean(b)) => Ok(b),
            None => Err(ChunkMessageError::UnexpectedAmfType(
                "expect a bool, got end of payload".to_string(),
            )),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a bool, got a {:?}",
                value
            ))),
        }
    }

    fn read_optional_number(&mut self) -> ChunkMessageResult<Option<f64>> {
        match self.inner.read()? {
            Some(Amf0Value::Number(n)) => Ok(Some(n)),
            Some(Amf0Value::Null) | Some(Amf0Value::Undefined) | None => Ok(None),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a number, got a {:?}",
                value
            ))),
        }
    }

    fn read_optional_bool(&mut self) -> ChunkMessageResult<Option<bool>> {
        match self.inner.read()? {
            Some(Amf0Value::Boolean(b)) => Ok(Some(b)),
            Some(Amf0Value::Null) | Some(Amf0Value::Undefined) | None => Ok(None),
            Some(value) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                "expect a bool, got a {:?}",
                value
            ))),
        }
    }

    fn read_amf_object(&mut self) -> ChunkMessageResult<Option<HashMap<String, amf::Value>>> {
        match self.inner.read()? {
            Some(Amf0Value::Null) | Some(Amf0Value::Undefined) | None => Ok(None),
            Some(value) => match value.try_into_pairs() {
                Ok(pairs) => Ok(Some(pairs.into_iter().collect())),
                Err(v) => Err(ChunkMessageError::UnexpectedAmfType(format!(
                    "expect a key-value pair type, got a {:?}",
                    v
                ))),
            },
        }
    }

    fn read_amf_any(&mut self) -> ChunkMessageResult<Option<amf::Value>> {
        Ok(self.inner.read()?)
    }
}

#[cfg(test)]
mod tests {
    use utils::traits::writer::WriteTo;

    use crate::commands::RtmpC2SCommands;

    use super::Reader;

    fn encode_values(values: &[amf::Value]) -> Vec<u8> {
        let mut buf = Vec::new();
        for v in values {
            v.write_to(&mut buf).unwrap();
        }
        buf
    }

    #[test]
    fn connect() {
        let bytes = encode_values(&[
            amf::Value::from("connect"),
            amf::Value::Number(1.0),
            amf::Value::object(vec![
                ("app", amf::Value::from("live")),
                ("tcUrl", amf::Value::from("rtmp://h/live")),
                ("objectEncoding", amf::Value::Number(0.0)),
            ]),
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::Connect(request) => {
                assert_eq!(request.transaction_id, 1.0);
                assert_eq!(request.command_object.app, "live");
                assert_eq!(request.command_object.tc_url, "rtmp://h/live");
                assert_eq!(request.command_object.object_encoding, 0);
                assert!(request.optional_user_arguments.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn connect_with_sparse_command_object() {
        let bytes = encode_values(&[
            amf::Value::from("connect"),
            amf::Value::Number(1.0),
            amf::Value::object(vec![("app", amf::Value::from("live"))]),
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::Connect(request) => {
                assert_eq!(request.command_object.app, "live");
                assert_eq!(request.command_object.object_encoding, 0);
                assert!(request.command_object.flash_version.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn create_stream() {
        let bytes = encode_values(&[
            amf::Value::from("createStream"),
            amf::Value::Number(2.0),
            amf::Value::Null,
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::CreateStream(request) => {
                assert_eq!(request.transaction_id, 2.0);
                assert!(request.command_object.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn publish() {
        let bytes = encode_values(&[
            amf::Value::from("publish"),
            amf::Value::Number(3.0),
            amf::Value::Null,
            amf::Value::from("mystream"),
            amf::Value::from("live"),
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::Publish(request) => {
                assert_eq!(request.transaction_id, 3.0);
                assert_eq!(request.publishing_name, "mystream");
                assert_eq!(request.publishing_type, "live");
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn publish_with_bad_type_is_rejected() {
        let bytes = encode_values(&[
            amf::Value::from("publish"),
            amf::Value::Number(3.0),
            amf::Value::Null,
            amf::Value::from("mystream"),
            amf::Value::from("broadcast"),
        ]);
        assert!(Reader::new(&bytes[..]).read_c2s_command().is_err());
    }

    #[test]
    fn play_defaults_optional_arguments() {
        let bytes = encode_values(&[
            amf::Value::from("play"),
            amf::Value::Number(4.0),
            amf::Value::Null,
            amf::Value::from("mystream"),
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::Play(request) => {
                assert_eq!(request.stream_name, "mystream");
                assert_eq!(request.start, -2.0);
                assert_eq!(request.duration, -1.0);
                assert!(!request.reset);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn release_stream_decodes_as_call() {
        let bytes = encode_values(&[
            amf::Value::from("releaseStream"),
            amf::Value::Number(2.0),
            amf::Value::Null,
            amf::Value::from("mystream"),
        ]);
        match Reader::new(&bytes[..]).read_c2s_command().unwrap() {
            RtmpC2SCommands::Call(request) => {
                assert_eq!(request.procedure_name, "releaseStream");
                assert_eq!(request.transaction_id, 2.0);
                assert!(request.command_object.is_none());
                assert_eq!(
                    request.optional_arguments,
                    Some(amf::Value::from("mystream"))
                );
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
