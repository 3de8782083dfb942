use clap::Parser;
use stream_hub::hub::StreamHub;
use time::macros::format_description;
use tokio::signal;
use tracing_subscriber::{self, EnvFilter, fmt::time::LocalTime};

mod cli;
mod config;
mod errors;
mod util;

use cli::AppCli;
use config::AppConfig;

#[tokio::main]
async fn main() {
    let cli_args = AppCli::parse();
    let mut app_config = match AppConfig::new(
        cli_args
            .config
            .as_ref()
            .and_then(|p| p.to_str().map(|s| s.to_string())),
    ) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("failed to load config: {}", err);
            std::process::exit(1);
        }
    };
    app_config.apply(&cli_args);
    if let Err(err) = app_config.validate() {
        eprintln!("invalid config: {}", err);
        std::process::exit(1);
    }

    let level = util::parse_log_level(&app_config.logger.level).expect("the level was validated");
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_timer(LocalTime::new(format_description!(
            "[year]-[month]-[day] [hour]:[minute]:[second]"
        )))
        .compact()
        .with_file(true)
        .with_line_number(true)
        .with_thread_names(true)
        .with_target(true)
        .with_env_filter(
            EnvFilter::try_from_env("RILL_LOG")
                .unwrap_or_else(|_| EnvFilter::new(app_config.logger.level.clone())),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("no other subscriber is installed");

    let mut stream_hub = StreamHub::new();
    let hub_event_sender = stream_hub.get_event_sender();
    tokio::spawn(async move { stream_hub.run().await });

    if app_config.rtmp_server.enable {
        let server_config = app_config.rtmp_server_config();
        let mut rtmp_server = rtmp_ingress::server::RtmpServer::new(server_config, hub_event_sender);
        tokio::spawn(async move {
            if let Err(err) = rtmp_server.run().await {
                tracing::error!("rtmp ingress exited: {}", err);
            }
        });
    } else {
        tracing::warn!("the rtmp server is disabled by config");
    }

    let _ = signal::ctrl_c().await;
    tracing::info!("shutting down");
}
