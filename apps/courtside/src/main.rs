use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use courtside_client_core::api::ApiClient;
use courtside_client_core::config::Config;
use courtside_client_core::notifications::{
    ConnectionManager, EventCallback, Notification, NotificationFeed, NotificationId,
};
use courtside_client_core::telemetry::logging::{self, LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "courtside")]
struct Cli {
    /// Backend server address (host:port or full URL)
    #[arg(long, short = 's')]
    server: Option<String>,

    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,

    /// Write logs to a file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream notifications until interrupted (default)
    Tail,
    /// Print the current notification list and exit
    List,
    /// Mark one notification as read
    Read { id: String },
    /// Mark every notification as read
    ReadAll,
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_config = LogConfig {
        level: cli.log_level,
        file: cli.log_file.clone(),
    };
    if let Err(e) = logging::init(&log_config) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(2);
    }

    let config = match cli.server.as_deref() {
        Some(server) => Config::new(server),
        None => Config::from_env(),
    };

    if let Err(e) = run(cli.command.unwrap_or(Command::Tail), config).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command, config: Config) -> Result<()> {
    let api = ApiClient::new(&config.api_base_url())?;
    let feed = NotificationFeed::new(api);

    match command {
        Command::List => {
            feed.load().await;
            print_feed(&feed);
        }
        Command::Read { id } => {
            feed.load().await;
            feed.mark_read(&NotificationId::new(id)).await;
            print_feed(&feed);
        }
        Command::ReadAll => {
            feed.load().await;
            feed.mark_all_read().await;
            print_feed(&feed);
        }
        Command::Tail => {
            let manager = ConnectionManager::new(config.notifications_ws_url());

            let merge = feed.callback();
            let on_event: EventCallback = Arc::new(move |notification: Notification| {
                println!("🔔 {}", render(&notification));
                merge(notification);
            });
            let _handle = manager.acquire(on_event);

            feed.load().await;
            print_feed(&feed);

            tokio::signal::ctrl_c().await?;
            manager.release().await;
        }
    }
    Ok(())
}

fn print_feed(feed: &NotificationFeed) {
    for notification in feed.notifications() {
        let marker = if notification.read { ' ' } else { '•' };
        println!("{marker} {}", render(&notification));
    }
    println!("{} unread", feed.unread_count());
}

fn render(notification: &Notification) -> String {
    let mut line = format!("[{}] {}", notification.id, notification.message);
    if let Some(when) = &notification.time {
        line.push_str(&format!(" ({when})"));
    }
    if let Some(url) = &notification.related_url {
        line.push_str(&format!(" → {url}"));
    }
    line
}
