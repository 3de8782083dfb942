use std::fmt;

use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

use crate::{errors::StreamHubResult, frame::MediaMessage};

/// A published stream is addressed by application name plus stream name,
/// both taken from the publisher's commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub app: String,
    pub stream_name: String,
}

impl fmt::Display for StreamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app, self.stream_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublishType {
    #[default]
    Live,
    Record,
    Append,
}

impl TryFrom<&str> for PublishType {
    type Error = String;
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "live" => Ok(PublishType::Live),
            "record" => Ok(PublishType::Record),
            "append" => Ok(PublishType::Append),
            other => Err(format!("unknown publish type: {}", other)),
        }
    }
}

impl fmt::Display for PublishType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishType::Live => write!(f, "live"),
            PublishType::Record => write!(f, "record"),
            PublishType::Append => write!(f, "append"),
        }
    }
}

#[derive(Debug)]
pub struct SubscribeResponse {
    pub subscriber_id: Uuid,
    pub media_receiver: mpsc::Receiver<MediaMessage>,
}

/// Requests a connection task sends to the hub. Admission decisions come
/// back on the oneshot; the connection blocks on it, which keeps command
/// handling causally ordered on the wire.
#[derive(Debug)]
pub enum StreamHubEvent {
    ConnectionOpened {
        connection_id: Uuid,
        app: String,
        tc_url: String,
        object_encoding: u8,
        result_sender: oneshot::Sender<StreamHubResult<()>>,
    },
    ConnectionClosed {
        connection_id: Uuid,
        reason: String,
    },
    Publish {
        key: StreamKey,
        publish_type: PublishType,
        connection_id: Uuid,
        result_sender: oneshot::Sender<StreamHubResult<mpsc::Sender<MediaMessage>>>,
    },
    Unpublish {
        key: StreamKey,
        result_sender: oneshot::Sender<StreamHubResult<()>>,
    },
    Subscribe {
        key: StreamKey,
        result_sender: oneshot::Sender<StreamHubResult<SubscribeResponse>>,
    },
    Unsubscribe {
        key: StreamKey,
        subscriber_id: Uuid,
        result_sender: oneshot::Sender<StreamHubResult<()>>,
    },
}
