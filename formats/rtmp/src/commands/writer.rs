use std::io;

use amf::amf0::Value as Amf0Value;
use utils::traits::writer::WriteTo;

use crate::chunk::errors::{ChunkMessageError, ChunkMessageResult};

use super::{
    ConnectCommandResponse, CreateStreamCommandResponse, OnStatusCommand, RtmpS2CCommands,
    consts::s2c_command_names,
};

/// Encodes server-to-client command messages. Objects are written as
/// ordered pairs so the reply fields appear on the wire in the order they
/// were assembled.
#[derive(Debug)]
pub struct Writer<W> {
    inner: W,
}

impl<W> Writer<W>
where
    W: io::Write,
{
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write(&mut self, command: &RtmpS2CCommands) -> ChunkMessageResult<()> {
        match command {
            RtmpS2CCommands::Connect(response) => self.write_connect_response(response),
            RtmpS2CCommands::Call(response) => {
                self.write_result_header(response.success, response.transaction_id)?;
                Amf0Value::write_null(&mut self.inner)?;
                Amf0Value::write_null(&mut self.inner)?;
                Ok(())
            }
            RtmpS2CCommands::CreateStream(response) => self.write_create_stream_response(response),
            RtmpS2CCommands::OnStatus(command) => self.write_on_status(command),
        }
    }

    fn write_result_header(&mut self, success: bool, transaction_id: f64) -> ChunkMessageResult<()> {
        let command_name = if success {
            s2c_command_names::RESULT
        } else {
            s2c_command_names::ERROR
        };
        Amf0Value::write_string(&mut self.inner, command_name)?;
        Amf0Value::write_number(&mut self.inner, transaction_id)?;
        Ok(())
    }

    fn write_connect_response(
        &mut self,
        response: &ConnectCommandResponse,
    ) -> ChunkMessageResult<()> {
        self.write_result_header(response.success, response.transaction_id)?;
        if response.properties.is_empty() {
            Amf0Value::write_null(&mut self.inner)?;
        } else {
            Amf0Value::write_anonymous_object(&mut self.inner, &response.properties)?;
        }
        Amf0Value::write_anonymous_object(&mut self.inner, &response.information)?;
        Ok(())
    }

    fn write_create_stream_response(
        &mut self,
        response: &CreateStreamCommandResponse,
    ) -> ChunkMessageResult<()> {
        self.write_result_header(response.success, response.transaction_id)?;
        Amf0Value::write_null(&mut self.inner)?;
        Amf0Value::write_number(&mut self.inner, response.stream_id)?;
        Ok(())
    }

    fn write_on_status(&mut self, command: &OnStatusCommand) -> ChunkMessageResult<()> {
        Amf0Value::write_string(&mut self.inner, s2c_command_names::ON_STATUS)?;
        Amf0Value::write_number(&mut self.inner, command.transaction_id)?;
        Amf0Value::write_null(&mut self.inner)?;
        Amf0Value::write_anonymous_object(&mut self.inner, &command.info_object)?;
        Ok(())
    }
}

impl<W: io::Write> WriteTo<W> for RtmpS2CCommands {
    type Error = ChunkMessageError;
    fn write_to(&self, writer: &mut W) -> Result<(), Self::Error> {
        Writer::new(writer).write(self)
    }
}
