use stream_hub::events::StreamHubEvent;
use tokio::sync::mpsc;

use super::{
    config::{RtmpServerConfig, RtmpSessionConfig},
    errors::RtmpServerResult,
    session::RtmpSession,
};

#[derive(Debug)]
pub struct RtmpServer {
    config: RtmpServerConfig,
    hub_event_sender: mpsc::UnboundedSender<StreamHubEvent>,
}

impl RtmpServer {
    pub fn new(
        config: RtmpServerConfig,
        hub_event_sender: mpsc::UnboundedSender<StreamHubEvent>,
    ) -> Self {
        Self {
            config,
            hub_event_sender,
        }
    }

    pub async fn run(&mut self) -> RtmpServerResult<()> {
        tracing::info!("rtmp ingress is running: {:?}", self.config);
        let listener =
            tokio::net::TcpListener::bind((self.config.address, self.config.port)).await?;
        loop {
            let (tcp_stream, addr) = listener.accept().await?;
            tracing::info!("got new rtmp connection, peer addr: {}", addr);
            let session_config = RtmpSessionConfig::from(&self.config);
            let mut session =
                RtmpSession::new(tcp_stream, self.hub_event_sender.clone(), session_config);
            tokio::spawn(async move {
                match session.run().await {
                    Ok(()) => {
                        tracing::info!("rtmp session closed, peer addr: {}", addr);
                        session.clean_up("session closed").await;
                    }
                    Err(err) => {
                        tracing::error!("rtmp session failed, peer addr: {}: {}", addr, err);
                        session.clean_up(&format!("session failed: {}", err)).await;
                    }
                };
                session.log_stats();
            });
        }
    }
}
