use std::collections::HashMap;

use tokio::sync::mpsc::{self, error::TrySendError};
use uuid::Uuid;

use crate::{
    errors::{StreamHubError, StreamHubResult},
    events::{PublishType, StreamHubEvent, StreamKey, SubscribeResponse},
    frame::MediaMessage,
};

/// Frames buffered per subscriber before the hub considers it lagging and
/// disconnects it.
const SUBSCRIBER_CHANNEL_CAPACITY: usize = 512;
/// Frames buffered between a publishing session and its stream source.
const PUBLISH_CHANNEL_CAPACITY: usize = 512;

#[derive(Debug)]
enum SourceCommand {
    AddSubscriber {
        id: Uuid,
        sender: mpsc::Sender<MediaMessage>,
    },
    RemoveSubscriber {
        id: Uuid,
    },
}

/// One task per published stream, fanning incoming frames out to every
/// subscriber. Ends when the publisher drops its sender or the hub drops
/// the command channel (unpublish).
#[derive(Debug)]
struct StreamSource {
    key: StreamKey,
    media_receiver: mpsc::Receiver<MediaMessage>,
    command_receiver: mpsc::UnboundedReceiver<SourceCommand>,
    subscribers: HashMap<Uuid, mpsc::Sender<MediaMessage>>,
    frames_distributed: u64,
}

impl StreamSource {
    async fn run(mut self) {
        loop {
            tokio::select! {
                maybe_frame = self.media_receiver.recv() => match maybe_frame {
                    Some(frame) => self.distribute(frame),
                    None => {
                        tracing::info!("publisher of {} is gone, stream source exits", self.key);
                        break;
                    }
                },
                maybe_command = self.command_receiver.recv() => match maybe_command {
                    Some(command) => self.process_command(command),
                    None => {
                        tracing::info!("stream {} unpublished, stream source exits", self.key);
                        break;
                    }
                },
            }
        }
        tracing::info!(
            "stream source {} distributed {} frames to its subscribers",
            self.key,
            self.frames_distributed
        );
    }

    fn process_command(&mut self, command: SourceCommand) {
        match command {
            SourceCommand::AddSubscriber { id, sender } => {
                tracing::info!("subscriber {} joins {}", id, self.key);
                self.subscribers.insert(id, sender);
            }
            SourceCommand::RemoveSubscriber { id } => {
                tracing::info!("subscriber {} leaves {}", id, self.key);
                self.subscribers.remove(&id);
            }
        }
    }

    fn distribute(&mut self, frame: MediaMessage) {
        self.frames_distributed += 1;
        let key = &self.key;
        self.subscribers
            .retain(|id, sender| match sender.try_send(frame.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!("subscriber {} of {} is lagging, dropping it", id, key);
                    false
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::info!("subscriber {} of {} went away", id, key);
                    false
                }
            });
    }
}

#[derive(Debug)]
struct StreamHandle {
    publisher_id: Uuid,
    publish_type: PublishType,
    command_sender: mpsc::UnboundedSender<SourceCommand>,
}

/// The engine's downstream consumer: admits connections and publishes,
/// owns the registry of live streams, and wires publishers to players.
/// Connection tasks talk to it exclusively through `StreamHubEvent`s.
#[derive(Debug)]
pub struct StreamHub {
    event_receiver: mpsc::UnboundedReceiver<StreamHubEvent>,
    event_sender: mpsc::UnboundedSender<StreamHubEvent>,
    streams: HashMap<StreamKey, StreamHandle>,
}

impl StreamHub {
    pub fn new() -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            event_receiver,
            event_sender,
            streams: HashMap::new(),
        }
    }

    pub fn get_event_sender(&self) -> mpsc::UnboundedSender<StreamHubEvent> {
        self.event_sender.clone()
    }

    pub async fn run(&mut self) {
        tracing::info!("stream hub is running");
        while let Some(event) = self.event_receiver.recv().await {
            self.process_event(event);
        }
    }

    fn process_event(&mut self, event: StreamHubEvent) {
        match event {
            StreamHubEvent::ConnectionOpened {
                connection_id,
                app,
                tc_url,
                object_encoding,
                result_sender,
            } => {
                tracing::info!(
                    "connection {} opened, app: {}, tcUrl: {}, objectEncoding: {}",
                    connection_id,
                    app,
                    tc_url,
                    object_encoding
                );
                let result = if app.is_empty() {
                    Err(StreamHubError::ConnectionRejected(
                        "empty app name".to_string(),
                    ))
                } else {
                    Ok(())
                };
                let _ = result_sender.send(result);
            }
            StreamHubEvent::ConnectionClosed {
                connection_id,
                reason,
            } => {
                tracing::info!("connection {} closed: {}", connection_id, reason);
                // reap anything this connection still publishes
                self.streams.retain(|key, handle| {
                    if handle.publisher_id == connection_id {
                        tracing::info!("reaping stream {} of closed connection", key);
                        false
                    } else {
                        true
                    }
                });
            }
            StreamHubEvent::Publish {
                key,
                publish_type,
                connection_id,
                result_sender,
            } => {
                let _ = result_sender.send(self.publish(key, publish_type, connection_id));
            }
            StreamHubEvent::Unpublish { key, result_sender } => {
                let _ = result_sender.send(self.unpublish(&key));
            }
            StreamHubEvent::Subscribe { key, result_sender } => {
                let _ = result_sender.send(self.subscribe(&key));
            }
            StreamHubEvent::Unsubscribe {
                key,
                subscriber_id,
                result_sender,
            } => {
                let _ = result_sender.send(self.unsubscribe(&key, subscriber_id));
            }
        }
    }

    fn publish(
        &mut self,
        key: StreamKey,
        publish_type: PublishType,
        connection_id: Uuid,
    ) -> StreamHubResult<mpsc::Sender<MediaMessage>> {
        if key.stream_name.is_empty() {
            return Err(StreamHubError::InvalidStreamKey(key.to_string()));
        }
        if self.streams.contains_key(&key) {
            return Err(StreamHubError::DuplicateStream(key));
        }

        let (media_sender, media_receiver) = mpsc::channel(PUBLISH_CHANNEL_CAPACITY);
        let (command_sender, command_receiver) = mpsc::unbounded_channel();
        let source = StreamSource {
            key: key.clone(),
            media_receiver,
            command_receiver,
            subscribers: HashMap::new(),
            frames_distributed: 0,
        };
        tokio::spawn(source.run());

        tracing::info!(
            "stream {} published as {} by connection {}",
            key,
            publish_type,
            connection_id
        );
        self.streams.insert(
            key,
            StreamHandle {
                publisher_id: connection_id,
                publish_type,
                command_sender,
            },
        );
        Ok(media_sender)
    }

    fn unpublish(&mut self, key: &StreamKey) -> StreamHubResult<()> {
        match self.streams.remove(key) {
            Some(handle) => {
                tracing::info!(
                    "stream {} ({}) unpublished",
                    key,
                    handle.publish_type
                );
                Ok(())
            }
            None => Err(StreamHubError::StreamNotFound(key.clone())),
        }
    }

    fn subscribe(&mut self, key: &StreamKey) -> StreamHubResult<SubscribeResponse> {
        let handle = self
            .streams
            .get(key)
            .ok_or_else(|| StreamHubError::StreamNotFound(key.clone()))?;

        let subscriber_id = Uuid::now_v7();
        let (sender, receiver) = mpsc::channel(SUBSCRIBER_CHANNEL_CAPACITY);
        handle
            .command_sender
            .send(SourceCommand::AddSubscriber {
                id: subscriber_id,
                sender,
            })
            .map_err(|_| StreamHubError::ChannelClosed)?;
        Ok(SubscribeResponse {
            subscriber_id,
            media_receiver: receiver,
        })
    }

    fn unsubscribe(&mut self, key: &StreamKey, subscriber_id: Uuid) -> StreamHubResult<()> {
        let handle = self
            .streams
            .get(key)
            .ok_or_else(|| StreamHubError::StreamNotFound(key.clone()))?;
        handle
            .command_sender
            .send(SourceCommand::RemoveSubscriber { id: subscriber_id })
            .map_err(|_| StreamHubError::ChannelClosed)?;
        Ok(())
    }
}

impl Default for StreamHub {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::{mpsc, oneshot};
    use tokio_util::bytes::BytesMut;
    use uuid::Uuid;

    use crate::{
        errors::{StreamHubError, StreamHubResult},
        events::{PublishType, StreamHubEvent, StreamKey, SubscribeResponse},
        frame::MediaMessage,
    };

    use super::StreamHub;

    fn key(name: &str) -> StreamKey {
        StreamKey {
            app: "live".to_string(),
            stream_name: name.to_string(),
        }
    }

    fn start_hub() -> mpsc::UnboundedSender<StreamHubEvent> {
        let mut hub = StreamHub::new();
        let sender = hub.get_event_sender();
        tokio::spawn(async move { hub.run().await });
        sender
    }

    async fn publish(
        events: &mpsc::UnboundedSender<StreamHubEvent>,
        key: StreamKey,
    ) -> StreamHubResult<mpsc::Sender<MediaMessage>> {
        let (tx, rx) = oneshot::channel();
        events
            .send(StreamHubEvent::Publish {
                key,
                publish_type: PublishType::Live,
                connection_id: Uuid::now_v7(),
                result_sender: tx,
            })
            .unwrap();
        rx.await.unwrap()
    }

    async fn subscribe(
        events: &mpsc::UnboundedSender<StreamHubEvent>,
        key: StreamKey,
    ) -> StreamHubResult<SubscribeResponse> {
        let (tx, rx) = oneshot::channel();
        events
            .send(StreamHubEvent::Subscribe {
                key,
                result_sender: tx,
            })
            .unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn frames_flow_from_publisher_to_subscriber() {
        let events = start_hub();
        let producer = publish(&events, key("mystream")).await.unwrap();
        let mut response = subscribe(&events, key("mystream")).await.unwrap();

        producer
            .send(MediaMessage::Audio {
                timestamp: 40,
                stream_id: 1,
                payload: BytesMut::from(&[0xAAu8, 0xBB][..]),
            })
            .await
            .unwrap();

        match response.media_receiver.recv().await.unwrap() {
            MediaMessage::Audio {
                timestamp, payload, ..
            } => {
                assert_eq!(timestamp, 40);
                assert_eq!(&payload[..], &[0xAA, 0xBB]);
            }
            other => panic!("unexpected frame: {:?}", other),
        }
    }

    #[tokio::test]
    async fn duplicate_publish_is_rejected() {
        let events = start_hub();
        publish(&events, key("mystream")).await.unwrap();
        assert!(matches!(
            publish(&events, key("mystream")).await,
            Err(StreamHubError::DuplicateStream(_))
        ));
    }

    #[tokio::test]
    async fn subscribing_to_an_unpublished_stream_fails() {
        let events = start_hub();
        assert!(matches!(
            subscribe(&events, key("nosuch")).await,
            Err(StreamHubError::StreamNotFound(_))
        ));
    }

    #[tokio::test]
    async fn empty_app_connections_are_rejected() {
        let events = start_hub();
        let (tx, rx) = oneshot::channel();
        events
            .send(StreamHubEvent::ConnectionOpened {
                connection_id: Uuid::now_v7(),
                app: String::new(),
                tc_url: String::new(),
                object_encoding: 0,
                result_sender: tx,
            })
            .unwrap();
        assert!(matches!(
            rx.await.unwrap(),
            Err(StreamHubError::ConnectionRejected(_))
        ));
    }

    #[tokio::test]
    async fn unpublish_makes_the_name_available_again() {
        let events = start_hub();
        publish(&events, key("mystream")).await.unwrap();

        let (tx, rx) = oneshot::channel();
        events
            .send(StreamHubEvent::Unpublish {
                key: key("mystream"),
                result_sender: tx,
            })
            .unwrap();
        rx.await.unwrap().unwrap();

        publish(&events, key("mystream")).await.unwrap();
    }
}
