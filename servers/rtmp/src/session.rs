use std::{
    io::{self, Cursor},
    time::Duration,
};

use rtmp_formats::{
    chunk::{self, ChunkMessage, ChunkMessageCommonHeader, RtmpChunkMessageBody, consts::MAX_CHUNK_SIZE, errors::ChunkMessageError},
    commands::{
        CallCommandRequest, ConnectCommandRequest, CreateStreamCommandRequest,
        DeleteStreamCommand, PlayCommand, PublishCommand, RtmpC2SCommands,
    },
    handshake::server::HandshakeServer,
    message::RtmpUserMessageBody,
    protocol_control::{
        Acknowledgement, ProtocolControlMessage, SetChunkSize, SetPeerBandwidth,
        SetPeerBandwidthLimitType, WindowAckSize,
    },
    user_control::UserControlEvent,
};
use stream_hub::{
    events::{PublishType, StreamHubEvent, StreamKey, SubscribeResponse},
    frame::MediaMessage,
};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufWriter},
    sync::{mpsc, oneshot},
    time::timeout,
};
use tokio_util::bytes::{Buf, BytesMut};
use uuid::Uuid;

use super::{
    config::RtmpSessionConfig,
    consts::{FMS_CAPABILITIES, FMS_MODE, FMSVER, response_code, response_level},
    errors::{RtmpServerError, RtmpServerResult},
};

#[derive(Debug, Default)]
pub struct SessionStat {
    audio_frame_cnt: u64,
    video_frame_cnt: u64,
    meta_frame_cnt: u64,
    aggregate_frame_cnt: u64,
    failed_frame_cnt: u64,
}

/// The NetConnection/NetStream position of this connection. Commands
/// arriving in the wrong state get an error reply and the connection
/// stays up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NetSessionState {
    Connecting,
    Connected,
    Publishing,
    Playing,
    Closing,
}

#[derive(Debug)]
struct PublishHandle {
    media_producer: mpsc::Sender<MediaMessage>,
}

#[derive(Debug)]
struct PlayHandle {
    media_receiver: mpsc::Receiver<MediaMessage>,
    subscriber_id: Uuid,
    receive_audio: bool,
    receive_video: bool,
    buffer_length: Option<u32>,
}

#[derive(Debug)]
enum SessionRuntime {
    Publish(PublishHandle),
    Play(PlayHandle),
    Idle,
}

#[derive(Debug, Default)]
struct StreamProperties {
    app: String,
    tc_url: String,
    stream_name: String,
    publish_type: PublishType,
    object_encoding: u8,
}

#[derive(Debug, PartialEq, Eq)]
enum PlayFlow {
    Continue,
    End,
}

/// One RTMP connection: handshake, chunk decode, the command state
/// machine, and media forwarding. Owns every piece of per-connection
/// state; nothing here is shared across connections.
#[derive(Debug)]
pub struct RtmpSession<T> {
    connection_id: Uuid,
    read_buffer: BytesMut,
    stream: BufWriter<T>,
    chunk_reader: chunk::reader::Reader,
    chunk_writer: chunk::writer::Writer,

    state: NetSessionState,
    runtime_handle: SessionRuntime,
    stream_properties: StreamProperties,

    /// Stream ids handed out by createStream, starting at 1.
    next_stream_id: u32,
    current_stream_id: u32,

    /// The peer's advertised acknowledgement window (type 5).
    ack_window_in: Option<u32>,
    last_acked_bytes: u64,
    last_ack_received: Option<u32>,
    peer_bandwidth: Option<SetPeerBandwidth>,
    outstanding_ping: Option<u32>,
    pending_buffer_length: Option<u32>,
    receive_audio: bool,
    receive_video: bool,

    stat: SessionStat,
    config: RtmpSessionConfig,
    hub_event_sender: mpsc::UnboundedSender<StreamHubEvent>,
}

impl<T> RtmpSession<T>
where
    T: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(
        io: T,
        hub_event_sender: mpsc::UnboundedSender<StreamHubEvent>,
        config: RtmpSessionConfig,
    ) -> Self {
        Self {
            connection_id: Uuid::now_v7(),
            read_buffer: BytesMut::with_capacity(4096),
            stream: BufWriter::new(io),
            chunk_reader: chunk::reader::Reader::with_max_message_size(config.max_message_size),
            chunk_writer: chunk::writer::Writer::new(),

            state: NetSessionState::Connecting,
            runtime_handle: SessionRuntime::Idle,
            stream_properties: StreamProperties::default(),

            next_stream_id: 1,
            current_stream_id: 1,

            ack_window_in: None,
            last_acked_bytes: 0,
            last_ack_received: None,
            peer_bandwidth: None,
            outstanding_ping: None,
            pending_buffer_length: None,
            receive_audio: true,
            receive_video: true,

            stat: SessionStat::default(),
            config,
            hub_event_sender,
        }
    }

    pub async fn run(&mut self) -> RtmpServerResult<()> {
        HandshakeServer::new(&mut self.stream).handshake().await?;
        self.chunk_writer.write_set_chunk_size(self.config.chunk_size)?;
        self.flush_chunk().await?;

        loop {
            match self.read_chunk().await {
                Ok(Some(message)) => {
                    tracing::trace!("got message: {:?}", message.header);
                    self.process_message(message).await?;
                }
                Ok(None) => {
                    tracing::info!("connection {} done", self.connection_id);
                    return Ok(());
                }
                Err(RtmpServerError::ChunkMessageReadFailed(err)) if err_is_recoverable(&err) => {
                    tracing::warn!("recoverable decode failure, replying _error: {}", err);
                    self.chunk_writer.write_call_response(false, 0.0)?;
                    self.flush_chunk().await?;
                }
                Err(err) => return Err(err),
            }

            if self.state == NetSessionState::Playing {
                let mut handle =
                    match std::mem::replace(&mut self.runtime_handle, SessionRuntime::Idle) {
                        SessionRuntime::Play(handle) => handle,
                        other => {
                            self.runtime_handle = other;
                            continue;
                        }
                    };
                let result = self.playing(&mut handle).await;
                self.unsubscribe_from_hub(handle.subscriber_id).await;
                self.state = NetSessionState::Closing;
                match result {
                    Ok(()) => {
                        tracing::info!(
                            "play session {} ended, peer buffer length: {:?}",
                            self.connection_id,
                            handle.buffer_length
                        );
                        return Ok(());
                    }
                    Err(err) => return Err(err),
                }
            }
        }
    }

    /// Drives a playing connection: frames from the hub go out as chunks,
    /// while inbound bytes are still decoded for control traffic.
    async fn playing(&mut self, handle: &mut PlayHandle) -> RtmpServerResult<()> {
        let mut frames: Vec<MediaMessage> = Vec::with_capacity(128);
        loop {
            tokio::select! {
                count = handle.media_receiver.recv_many(&mut frames, 128) => {
                    if count == 0 {
                        tracing::info!("published stream is gone, ending play");
                        self.chunk_writer.write_stream_eof(self.current_stream_id)?;
                        self.flush_chunk().await?;
                        return Ok(());
                    }
                    for frame in frames.drain(..) {
                        self.write_frame(frame, handle.receive_audio, handle.receive_video)?;
                    }
                    self.flush_chunk().await?;
                }
                read = self.stream.read_buf(&mut self.read_buffer) => {
                    if read? == 0 {
                        tracing::info!("player went away");
                        return Ok(());
                    }
                    loop {
                        match self.poll_buffered_message() {
                            Ok(Some(message)) => {
                                if self.process_play_message(message, handle).await? == PlayFlow::End {
                                    return Ok(());
                                }
                            }
                            Ok(None) => break,
                            Err(err) => return Err(err.into()),
                        }
                    }
                }
            }
        }
    }

    fn write_frame(
        &mut self,
        frame: MediaMessage,
        receive_audio: bool,
        receive_video: bool,
    ) -> RtmpServerResult<()> {
        let stream_id = self.current_stream_id;
        let result = match frame {
            MediaMessage::Audio {
                timestamp, payload, ..
            } => {
                if !receive_audio {
                    return Ok(());
                }
                self.stat.audio_frame_cnt += 1;
                self.chunk_writer.write_audio(payload, timestamp, stream_id)
            }
            MediaMessage::Video {
                timestamp, payload, ..
            } => {
                if !receive_video {
                    return Ok(());
                }
                self.stat.video_frame_cnt += 1;
                self.chunk_writer.write_video(payload, timestamp, stream_id)
            }
            MediaMessage::Meta {
                timestamp, payload, ..
            } => {
                self.stat.meta_frame_cnt += 1;
                self.chunk_writer.write_meta(payload, timestamp, stream_id)
            }
            MediaMessage::Aggregate { .. } => {
                // aggregates are not re-framed for players
                self.stat.aggregate_frame_cnt += 1;
                return Ok(());
            }
        };
        if let Err(err) = result {
            self.stat.failed_frame_cnt += 1;
            return Err(err.into());
        }
        Ok(())
    }

    /// The control traffic a playing client may still send.
    async fn process_play_message(
        &mut self,
        message: ChunkMessage,
        handle: &mut PlayHandle,
    ) -> RtmpServerResult<PlayFlow> {
        match message.chunk_message_body {
            RtmpChunkMessageBody::ProtocolControl(request) => {
                self.process_protocol_control_message(request).await?;
            }
            RtmpChunkMessageBody::UserControl(event) => match event {
                UserControlEvent::SetBufferLength {
                    stream_id: _,
                    buffer_length,
                } => {
                    handle.buffer_length = Some(buffer_length);
                }
                event => self.process_user_control_event(event).await?,
            },
            RtmpChunkMessageBody::RtmpUserMessage(body) => match *body {
                RtmpUserMessageBody::C2SCommand(RtmpC2SCommands::ReceiveAudio(request)) => {
                    handle.receive_audio = request.flag;
                }
                RtmpUserMessageBody::C2SCommand(RtmpC2SCommands::ReceiveVideo(request)) => {
                    handle.receive_video = request.flag;
                }
                RtmpUserMessageBody::C2SCommand(RtmpC2SCommands::DeleteStream(_))
                | RtmpUserMessageBody::C2SCommand(RtmpC2SCommands::CloseStream(_)) => {
                    tracing::info!("player released its stream");
                    return Ok(PlayFlow::End);
                }
                RtmpUserMessageBody::C2SCommand(command) => {
                    tracing::warn!("ignoring command while playing: {:?}", command);
                }
                other => {
                    tracing::warn!("ignoring message while playing: {:?}", other);
                }
            },
        }
        Ok(PlayFlow::Continue)
    }

    /// Parses as many chunks as the read buffer holds; `Ok(Some)` per
    /// completed message. Consumed bytes are dropped from the buffer even
    /// when body decode fails, so a malformed command cannot wedge the
    /// stream position.
    fn poll_buffered_message(&mut self) -> Result<Option<ChunkMessage>, ChunkMessageError> {
        loop {
            let mut cursor = Cursor::new(&self.read_buffer);
            match self.chunk_reader.read(&mut cursor) {
                Ok(Some(message)) => {
                    let consumed = cursor.position() as usize;
                    self.read_buffer.advance(consumed);
                    return Ok(Some(message));
                }
                Ok(None) => return Ok(None),
                Err(ChunkMessageError::IncompleteChunk) => {
                    let consumed = cursor.position() as usize;
                    self.read_buffer.advance(consumed);
                }
                Err(err) => {
                    let consumed = cursor.position() as usize;
                    self.read_buffer.advance(consumed);
                    return Err(err);
                }
            }
        }
    }

    async fn read_chunk(&mut self) -> RtmpServerResult<Option<ChunkMessage>> {
        loop {
            let parsed = self.poll_buffered_message()?;
            self.maybe_acknowledge().await?;
            if let Some(message) = parsed {
                return Ok(Some(message));
            }

            let deadline_ms = match self.state {
                NetSessionState::Publishing if self.config.publish_idle_timeout_ms > 0 => {
                    self.config.publish_idle_timeout_ms
                }
                _ => self.config.read_timeout_ms,
            };

            let read = if deadline_ms == 0 {
                self.stream.read_buf(&mut self.read_buffer).await
            } else {
                match timeout(
                    Duration::from_millis(deadline_ms),
                    self.stream.read_buf(&mut self.read_buffer),
                )
                .await
                {
                    Ok(result) => result,
                    Err(_elapsed) => {
                        if self.state == NetSessionState::Publishing
                            && self.config.publish_idle_timeout_ms > 0
                        {
                            tracing::info!(
                                "publisher idle for {}ms, reaping",
                                self.config.publish_idle_timeout_ms
                            );
                            return Ok(None);
                        }
                        return Err(RtmpServerError::Io(io::Error::new(
                            io::ErrorKind::TimedOut,
                            "read timed out",
                        )));
                    }
                }
            };

            match read {
                Ok(0) => {
                    if self.read_buffer.is_empty() {
                        return Ok(None);
                    }
                    return Err(RtmpServerError::Io(io::Error::new(
                        io::ErrorKind::ConnectionReset,
                        "connection reset with a partial chunk buffered",
                    )));
                }
                Ok(_) => {}
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// One ACK each time the running byte total crosses the peer's window,
    /// carrying the total received since chunked mode began.
    async fn maybe_acknowledge(&mut self) -> RtmpServerResult<()> {
        let Some(window) = self.ack_window_in else {
            return Ok(());
        };
        if window == 0 {
            return Ok(());
        }
        let total = self.chunk_reader.get_bytes_received();
        if total - self.last_acked_bytes >= window as u64 {
            self.chunk_writer.write_acknowledgement(total as u32)?;
            self.flush_chunk().await?;
            self.last_acked_bytes = total;
        }
        Ok(())
    }

    async fn flush_chunk(&mut self) -> RtmpServerResult<()> {
        if self.config.write_timeout_ms == 0 {
            self.chunk_writer.flush_to(&mut self.stream).await?;
            self.stream.flush().await?;
            return Ok(());
        }
        timeout(Duration::from_millis(self.config.write_timeout_ms), async {
            self.chunk_writer.flush_to(&mut self.stream).await?;
            self.stream.flush().await?;
            Ok::<(), RtmpServerError>(())
        })
        .await
        .map_err(|_| {
            RtmpServerError::Io(io::Error::new(io::ErrorKind::TimedOut, "write timed out"))
        })??;
        Ok(())
    }

    async fn process_message(&mut self, message: ChunkMessage) -> RtmpServerResult<()> {
        let header = message.header;
        match message.chunk_message_body {
            RtmpChunkMessageBody::ProtocolControl(request) => {
                self.process_protocol_control_message(request).await?
            }
            RtmpChunkMessageBody::UserControl(event) => {
                self.process_user_control_event(event).await?
            }
            RtmpChunkMessageBody::RtmpUserMessage(message) => {
                self.process_user_message(*message, header).await?
            }
        }
        Ok(())
    }

    async fn process_protocol_control_message(
        &mut self,
        request: ProtocolControlMessage,
    ) -> RtmpServerResult<()> {
        match request {
            ProtocolControlMessage::SetChunkSize(request) => {
                self.process_set_chunk_size(request);
            }
            ProtocolControlMessage::Abort(request) => {
                tracing::info!("got abort for csid {}", request.chunk_stream_id);
                self.chunk_reader.abort_chunk_stream(request.chunk_stream_id);
            }
            ProtocolControlMessage::Ack(request) => {
                self.process_acknowledgement(request);
            }
            ProtocolControlMessage::WindowAckSize(request) => {
                self.process_window_ack_size(request);
            }
            ProtocolControlMessage::SetPeerBandwidth(request) => {
                self.process_set_peer_bandwidth(request).await?;
            }
        }
        Ok(())
    }

    fn process_set_chunk_size(&mut self, request: SetChunkSize) {
        if request.chunk_size == 0 {
            tracing::warn!("ignoring set chunk size 0");
            return;
        }
        let chunk_size = request.chunk_size.min(MAX_CHUNK_SIZE);
        let old_size = self.chunk_reader.set_chunk_size(chunk_size as usize);
        tracing::trace!("inbound chunk size {} -> {}", old_size, chunk_size);
    }

    fn process_acknowledgement(&mut self, request: Acknowledgement) {
        tracing::trace!("peer acknowledged {} bytes", request.sequence_number);
        self.last_ack_received = Some(request.sequence_number);
    }

    fn process_window_ack_size(&mut self, request: WindowAckSize) {
        tracing::info!("peer window acknowledgement size: {}", request.size);
        self.ack_window_in = Some(request.size);
    }

    async fn process_set_peer_bandwidth(
        &mut self,
        request: SetPeerBandwidth,
    ) -> RtmpServerResult<()> {
        tracing::info!("got set peer bandwidth: {:?}", request);
        // record the limit and echo a window of the same size back
        let size = request.size;
        self.peer_bandwidth = Some(request);
        self.chunk_writer.write_window_ack_size(size)?;
        self.flush_chunk().await?;
        Ok(())
    }

    async fn process_user_control_event(
        &mut self,
        event: UserControlEvent,
    ) -> RtmpServerResult<()> {
        match event {
            UserControlEvent::StreamBegin { stream_id } => {
                tracing::info!("peer announced stream begin, stream id {}", stream_id);
            }
            UserControlEvent::StreamEOF { stream_id } => {
                tracing::info!("peer announced stream eof, stream id {}", stream_id);
            }
            UserControlEvent::StreamDry { stream_id } => {
                tracing::info!("peer announced stream dry, stream id {}", stream_id);
            }
            UserControlEvent::StreamIsRecorded { stream_id } => {
                tracing::info!("peer announced recorded stream, stream id {}", stream_id);
            }
            UserControlEvent::SetBufferLength {
                stream_id,
                buffer_length,
            } => {
                tracing::info!(
                    "peer buffer length for stream {}: {}ms",
                    stream_id,
                    buffer_length
                );
                self.pending_buffer_length = Some(buffer_length);
            }
            UserControlEvent::PingRequest { timestamp } => {
                tracing::trace!("got a ping request: {}", timestamp);
                self.chunk_writer.write_ping_response(timestamp)?;
                self.flush_chunk().await?;
            }
            UserControlEvent::PingResponse { timestamp } => {
                if self.outstanding_ping.take() != Some(timestamp) {
                    tracing::warn!("unsolicited ping response: {}", timestamp);
                }
            }
        }
        Ok(())
    }

    async fn process_user_message(
        &mut self,
        message: RtmpUserMessageBody,
        header: ChunkMessageCommonHeader,
    ) -> RtmpServerResult<()> {
        match message {
            RtmpUserMessageBody::C2SCommand(command) => {
                self.process_user_command(command).await?
            }
            RtmpUserMessageBody::MetaData { payload } => {
                self.forward_media(MediaMessage::Meta {
                    timestamp: header.timestamp,
                    stream_id: header.message_stream_id,
                    payload,
                })
                .await?
            }
            RtmpUserMessageBody::Audio { payload } => {
                self.forward_media(MediaMessage::Audio {
                    timestamp: header.timestamp,
                    stream_id: header.message_stream_id,
                    payload,
                })
                .await?
            }
            RtmpUserMessageBody::Video { payload } => {
                self.forward_media(MediaMessage::Video {
                    timestamp: header.timestamp,
                    stream_id: header.message_stream_id,
                    payload,
                })
                .await?
            }
            RtmpUserMessageBody::Aggregate { payload } => {
                self.forward_media(MediaMessage::Aggregate {
                    timestamp: header.timestamp,
                    stream_id: header.message_stream_id,
                    payload,
                })
                .await?
            }
            RtmpUserMessageBody::SharedObject { payload } => {
                tracing::info!("ignoring shared object message, {} bytes", payload.len());
            }
            RtmpUserMessageBody::S2CCommand(command) => {
                tracing::error!("got an unexpected s2c command: {:?}", command);
            }
        }
        Ok(())
    }

    async fn forward_media(&mut self, frame: MediaMessage) -> RtmpServerResult<()> {
        let SessionRuntime::Publish(handle) = &mut self.runtime_handle else {
            tracing::error!(
                "got {} bytes of media while not publishing",
                frame.payload_len()
            );
            return Ok(());
        };

        match &frame {
            MediaMessage::Audio { .. } => self.stat.audio_frame_cnt += 1,
            MediaMessage::Video { .. } => self.stat.video_frame_cnt += 1,
            MediaMessage::Meta { .. } => self.stat.meta_frame_cnt += 1,
            MediaMessage::Aggregate { .. } => self.stat.aggregate_frame_cnt += 1,
        }

        // backpressure from the hub blocks this connection's read path
        if handle.media_producer.send(frame).await.is_err() {
            self.stat.failed_frame_cnt += 1;
            tracing::error!("stream source is gone, ending publish session");
            return Err(RtmpServerError::StreamIsGone);
        }
        Ok(())
    }

    async fn process_user_command(&mut self, command: RtmpC2SCommands) -> RtmpServerResult<()> {
        match command {
            RtmpC2SCommands::Connect(request) => self.process_connect_command(request).await?,
            RtmpC2SCommands::Call(request) => self.process_call_request(request).await?,
            RtmpC2SCommands::CreateStream(request) => {
                self.process_create_stream_command(request).await?
            }
            RtmpC2SCommands::Publish(request) => self.process_publish_command(request).await?,
            RtmpC2SCommands::Play(request) => self.process_play_command(request).await?,
            RtmpC2SCommands::DeleteStream(request) => {
                self.process_delete_stream_command(request).await?
            }
            RtmpC2SCommands::CloseStream(_) => {
                self.release_stream().await;
            }
            RtmpC2SCommands::ReceiveAudio(request) => {
                self.receive_audio = request.flag;
            }
            RtmpC2SCommands::ReceiveVideo(request) => {
                self.receive_video = request.flag;
            }
            RtmpC2SCommands::Seek(request) => {
                tracing::warn!("seek is not supported for live streams: {:?}", request);
            }
            RtmpC2SCommands::Pause(request) => {
                tracing::warn!("pause is not supported for live streams: {:?}", request);
            }
        }
        Ok(())
    }

    async fn process_connect_command(
        &mut self,
        request: ConnectCommandRequest,
    ) -> RtmpServerResult<()> {
        if self.state != NetSessionState::Connecting {
            tracing::warn!("connect command in state {:?}", self.state);
            self.chunk_writer.write_connect_response(
                false,
                request.transaction_id,
                FMSVER,
                FMS_CAPABILITIES,
                FMS_MODE,
                response_level::ERROR,
                response_code::NET_CONNECTION_CONNECT_REJECTED,
                "already connected",
                self.stream_properties.object_encoding,
            )?;
            self.flush_chunk().await?;
            return Ok(());
        }

        let command_object = request.command_object;
        let (result_sender, result_receiver) = oneshot::channel();
        self.hub_event_sender
            .send(StreamHubEvent::ConnectionOpened {
                connection_id: self.connection_id,
                app: command_object.app.clone(),
                tc_url: command_object.tc_url.clone(),
                object_encoding: command_object.object_encoding,
                result_sender,
            })
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;
        let admission = result_receiver
            .await
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;

        if let Err(rejection) = admission {
            tracing::warn!("connection rejected by the hub: {}", rejection);
            self.chunk_writer.write_connect_response(
                false,
                request.transaction_id,
                FMSVER,
                FMS_CAPABILITIES,
                FMS_MODE,
                response_level::ERROR,
                response_code::NET_CONNECTION_CONNECT_REJECTED,
                &rejection.to_string(),
                command_object.object_encoding,
            )?;
            self.flush_chunk().await?;
            return Ok(());
        }

        self.chunk_writer.write_window_ack_size(self.config.window_ack_size)?;
        self.chunk_writer.write_set_peer_bandwidth(
            self.config.peer_bandwidth,
            SetPeerBandwidthLimitType::Dynamic,
        )?;
        self.chunk_writer.write_stream_begin(0)?;
        self.chunk_writer.write_connect_response(
            true,
            request.transaction_id,
            FMSVER,
            FMS_CAPABILITIES,
            FMS_MODE,
            response_level::STATUS,
            response_code::NET_CONNECTION_CONNECT_SUCCESS,
            "Connection succeeded.",
            command_object.object_encoding,
        )?;
        self.flush_chunk().await?;

        self.stream_properties.app = command_object.app;
        self.stream_properties.tc_url = command_object.tc_url;
        self.stream_properties.object_encoding = command_object.object_encoding;
        self.state = NetSessionState::Connected;
        tracing::info!(
            "connection {} connected to app {}",
            self.connection_id,
            self.stream_properties.app
        );
        Ok(())
    }

    async fn process_create_stream_command(
        &mut self,
        request: CreateStreamCommandRequest,
    ) -> RtmpServerResult<()> {
        if self.state == NetSessionState::Connecting {
            self.chunk_writer
                .write_create_stream_response(false, request.transaction_id, 0.0)?;
            self.flush_chunk().await?;
            return Ok(());
        }

        let stream_id = self.next_stream_id;
        self.next_stream_id += 1;
        self.current_stream_id = stream_id;
        self.chunk_writer.write_create_stream_response(
            true,
            request.transaction_id,
            stream_id as f64,
        )?;
        self.flush_chunk().await?;
        tracing::info!("created stream {}", stream_id);
        Ok(())
    }

    async fn process_call_request(&mut self, request: CallCommandRequest) -> RtmpServerResult<()> {
        match request.procedure_name.as_str() {
            "releaseStream" | "FCPublish" => {
                self.chunk_writer
                    .write_call_response(true, request.transaction_id)?;
                self.flush_chunk().await?;
            }
            "FCUnpublish" => {
                self.release_stream().await;
                self.chunk_writer
                    .write_call_response(true, request.transaction_id)?;
                self.flush_chunk().await?;
            }
            _ => {
                tracing::warn!("ignoring call request: {:?}", request);
            }
        }
        Ok(())
    }

    async fn process_publish_command(&mut self, request: PublishCommand) -> RtmpServerResult<()> {
        if self.state != NetSessionState::Connected {
            tracing::warn!("publish command in state {:?}", self.state);
            self.write_publish_rejection("publish is not allowed in this state")
                .await?;
            return Ok(());
        }
        if request.publishing_name.is_empty() {
            self.write_publish_rejection("empty stream name").await?;
            return Ok(());
        }

        let publish_type = PublishType::try_from(request.publishing_type.as_str())
            .map_err(RtmpServerError::InvalidStreamParam)?;
        let key = StreamKey {
            app: self.stream_properties.app.clone(),
            stream_name: request.publishing_name.clone(),
        };

        let (result_sender, result_receiver) = oneshot::channel();
        self.hub_event_sender
            .send(StreamHubEvent::Publish {
                key,
                publish_type,
                connection_id: self.connection_id,
                result_sender,
            })
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;
        let admission = result_receiver
            .await
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;

        match admission {
            Err(rejection) => {
                tracing::warn!("publish rejected by the hub: {}", rejection);
                self.write_publish_rejection(&rejection.to_string()).await?;
            }
            Ok(media_producer) => {
                self.chunk_writer.write_stream_begin(self.current_stream_id)?;
                self.chunk_writer.write_on_status(
                    response_level::STATUS,
                    response_code::NET_STREAM_PUBLISH_START,
                    &format!("Started publishing {}.", request.publishing_name),
                    Some(&request.publishing_name),
                    self.current_stream_id,
                )?;
                self.flush_chunk().await?;

                self.stream_properties.stream_name = request.publishing_name;
                self.stream_properties.publish_type = publish_type;
                self.runtime_handle = SessionRuntime::Publish(PublishHandle { media_producer });
                self.state = NetSessionState::Publishing;
                tracing::info!(
                    "connection {} is publishing {}/{}",
                    self.connection_id,
                    self.stream_properties.app,
                    self.stream_properties.stream_name
                );
            }
        }
        Ok(())
    }

    async fn write_publish_rejection(&mut self, description: &str) -> RtmpServerResult<()> {
        self.chunk_writer.write_on_status(
            response_level::ERROR,
            response_code::NET_STREAM_PUBLISH_BAD_NAME,
            description,
            None,
            self.current_stream_id,
        )?;
        self.flush_chunk().await?;
        Ok(())
    }

    async fn process_play_command(&mut self, request: PlayCommand) -> RtmpServerResult<()> {
        if self.state != NetSessionState::Connected {
            tracing::warn!("play command in state {:?}", self.state);
            self.chunk_writer.write_on_status(
                response_level::ERROR,
                response_code::NET_STREAM_PLAY_NOT_FOUND,
                "play is not allowed in this state",
                None,
                self.current_stream_id,
            )?;
            self.flush_chunk().await?;
            return Ok(());
        }

        let key = StreamKey {
            app: self.stream_properties.app.clone(),
            stream_name: request.stream_name.clone(),
        };
        let (result_sender, result_receiver) = oneshot::channel();
        self.hub_event_sender
            .send(StreamHubEvent::Subscribe { key, result_sender })
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;
        let subscription = result_receiver
            .await
            .map_err(|_| RtmpServerError::ChannelSendFailed)?;

        match subscription {
            Err(err) => {
                tracing::warn!("subscription failed: {}", err);
                self.chunk_writer.write_on_status(
                    response_level::ERROR,
                    response_code::NET_STREAM_PLAY_NOT_FOUND,
                    &err.to_string(),
                    None,
                    self.current_stream_id,
                )?;
                self.flush_chunk().await?;
            }
            Ok(SubscribeResponse {
                subscriber_id,
                media_receiver,
            }) => {
                self.chunk_writer.write_stream_begin(self.current_stream_id)?;
                if request.reset {
                    self.chunk_writer.write_on_status(
                        response_level::STATUS,
                        response_code::NET_STREAM_PLAY_RESET,
                        "resetting stream",
                        None,
                        self.current_stream_id,
                    )?;
                }
                self.chunk_writer.write_on_status(
                    response_level::STATUS,
                    response_code::NET_STREAM_PLAY_START,
                    &format!("Started playing {}.", request.stream_name),
                    Some(&request.stream_name),
                    self.current_stream_id,
                )?;
                self.flush_chunk().await?;

                self.stream_properties.stream_name = request.stream_name;
                self.runtime_handle = SessionRuntime::Play(PlayHandle {
                    media_receiver,
                    subscriber_id,
                    receive_audio: self.receive_audio,
                    receive_video: self.receive_video,
                    buffer_length: self.pending_buffer_length,
                });
                self.state = NetSessionState::Playing;
                tracing::info!(
                    "connection {} is playing {}/{}",
                    self.connection_id,
                    self.stream_properties.app,
                    self.stream_properties.stream_name
                );
            }
        }
        Ok(())
    }

    async fn process_delete_stream_command(
        &mut self,
        request: DeleteStreamCommand,
    ) -> RtmpServerResult<()> {
        tracing::info!("deleting stream {}", request.stream_id);
        self.release_stream().await;
        Ok(())
    }

    /// Tears down whatever this connection publishes or plays and returns
    /// the session to the Connected state. No reply is owed.
    async fn release_stream(&mut self) {
        match std::mem::replace(&mut self.runtime_handle, SessionRuntime::Idle) {
            SessionRuntime::Publish(_) => {
                self.unpublish_from_hub().await;
                self.state = NetSessionState::Connected;
            }
            SessionRuntime::Play(handle) => {
                self.unsubscribe_from_hub(handle.subscriber_id).await;
                self.state = NetSessionState::Connected;
            }
            SessionRuntime::Idle => {}
        }
    }

    async fn unpublish_from_hub(&mut self) {
        let key = StreamKey {
            app: self.stream_properties.app.clone(),
            stream_name: self.stream_properties.stream_name.clone(),
        };
        let (result_sender, result_receiver) = oneshot::channel();
        if self
            .hub_event_sender
            .send(StreamHubEvent::Unpublish { key, result_sender })
            .is_err()
        {
            tracing::error!("hub is gone, cannot unpublish");
            return;
        }
        match result_receiver.await {
            Ok(Ok(())) => tracing::info!(
                "unpublished {}/{}",
                self.stream_properties.app,
                self.stream_properties.stream_name
            ),
            Ok(Err(err)) => tracing::warn!("unpublish failed: {}", err),
            Err(_) => tracing::error!("hub dropped the unpublish result"),
        }
    }

    async fn unsubscribe_from_hub(&mut self, subscriber_id: Uuid) {
        let key = StreamKey {
            app: self.stream_properties.app.clone(),
            stream_name: self.stream_properties.stream_name.clone(),
        };
        let (result_sender, result_receiver) = oneshot::channel();
        if self
            .hub_event_sender
            .send(StreamHubEvent::Unsubscribe {
                key,
                subscriber_id,
                result_sender,
            })
            .is_err()
        {
            tracing::error!("hub is gone, cannot unsubscribe");
            return;
        }
        match result_receiver.await {
            Ok(Ok(())) => tracing::info!("unsubscribed {}", subscriber_id),
            Ok(Err(err)) => tracing::warn!("unsubscribe failed: {}", err),
            Err(_) => tracing::error!("hub dropped the unsubscribe result"),
        }
    }

    /// Final teardown: releases hub resources and reports the close. Safe
    /// to call once after `run` returns, whatever the outcome was.
    pub async fn clean_up(&mut self, reason: &str) {
        self.release_stream().await;
        self.state = NetSessionState::Closing;
        let _ = self.hub_event_sender.send(StreamHubEvent::ConnectionClosed {
            connection_id: self.connection_id,
            reason: reason.to_string(),
        });
    }

    pub fn log_stats(&self) {
        tracing::info!(
            "session {} stats: {:?}, audio {}, video {}, meta {}, aggregate {}, failed {}, wrote {} bytes, read {} bytes, last peer ack {:?}, peer bandwidth {:?}",
            self.connection_id,
            self.stream_properties,
            self.stat.audio_frame_cnt,
            self.stat.video_frame_cnt,
            self.stat.meta_frame_cnt,
            self.stat.aggregate_frame_cnt,
            self.stat.failed_frame_cnt,
            self.chunk_writer.get_bytes_written(),
            self.chunk_reader.get_bytes_received(),
            self.last_ack_received,
            self.peer_bandwidth,
        );
    }
}

fn err_is_recoverable(err: &ChunkMessageError) -> bool {
    matches!(
        err,
        ChunkMessageError::AmfRead(_)
            | ChunkMessageError::UnexpectedAmfType(_)
            | ChunkMessageError::UnexpectedCommandName(_)
    )
}
