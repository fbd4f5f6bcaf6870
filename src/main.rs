use chat_rust::{Chat, Client, ClientConfig, ObjectId};
use chat_rust_ureq_http_client::UreqHttpClient;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::sync::Arc;

// Inspect chat channels from the command line.
//
// Usage:
//   chat-rust --session-key KEY show sendbird_group_channel_123_abc
//   chat-rust --session-key KEY --json operators sendbird_group_channel_123_abc
//   chat-rust --session-key KEY --page-size 100 members sendbird_group_channel_123_abc

#[derive(Parser)]
#[command(name = "chat-rust")]
#[command(about = "Chat channel inspection tool")]
struct Cli {
    #[arg(short, long, env = "CHAT_SESSION_KEY")]
    session_key: Option<String>,

    /// Id of the logged-in user, sent along with presence and read calls.
    #[arg(short, long)]
    user_id: Option<String>,

    #[arg(long)]
    api_root: Option<String>,

    #[arg(long)]
    page_size: Option<u32>,

    #[arg(short, long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print every attribute of a chat.
    Show { channel: String },
    /// List the operators of a chat.
    Operators { channel: String },
    /// List all members of a chat.
    Members { channel: String },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = ClientConfig::default();
    if let Some(root) = cli.api_root {
        config.api_root = root;
    }
    if let Some(size) = cli.page_size {
        config.paginated_size = size;
    }

    let client = Client::new(Arc::new(UreqHttpClient::new()), config);
    if let Some(key) = cli.session_key {
        client.login(key, cli.user_id.map(ObjectId::from)).await;
    } else {
        info!("No session key given, requests are unauthenticated");
    }

    match cli.command {
        Commands::Show { channel } => show_chat(&client.chat(channel), cli.json).await,
        Commands::Operators { channel } => show_operators(&client.chat(channel), cli.json).await,
        Commands::Members { channel } => show_members(&client.chat(channel), cli.json).await,
    }
}

async fn show_chat(chat: &Chat, json_output: bool) -> Result<(), anyhow::Error> {
    let summary = json!({
        "channel_url": chat.channel_url().to_string(),
        "name": chat.name().await?,
        "type": chat.chat_type().await?,
        "is_public": chat.is_public().await?,
        "is_private": chat.is_private().await?,
        "is_direct": chat.is_direct().await?,
        "state": chat.state().await?,
        "member_count": chat.member_count().await?,
        "joined_member_count": chat.joined_member_count().await?,
        "unread_count": chat.unread_count().await?,
        "is_hidden": chat.is_hidden().await?,
        "is_push_enabled": chat.is_push_enabled().await?,
        "is_discoverable": chat.is_discoverable().await?,
        "is_frozen": chat.is_frozen().await?,
        "created_at": chat.created_at_time().await?.map(|t| t.to_rfc3339()),
        "invited_at": chat.invited_at_time().await?.map(|t| t.to_rfc3339()),
        "link": chat.link().await?,
        "cover": chat.cover().await?.map(|c| c.url().to_string()),
    });

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else if let Some(fields) = summary.as_object() {
        for (key, value) in fields {
            println!("{key:<20} {value}");
        }
    }
    Ok(())
}

async fn show_operators(chat: &Chat, json_output: bool) -> Result<(), anyhow::Error> {
    let ids: Vec<String> = chat
        .operators()
        .await?
        .iter()
        .map(|op| op.id().to_string())
        .collect();

    if json_output {
        println!("{}", serde_json::to_string_pretty(&ids)?);
    } else {
        info!("{} operator(s) in {}", ids.len(), chat.channel_url());
        for id in ids {
            println!("{id}");
        }
    }
    Ok(())
}

async fn show_members(chat: &Chat, json_output: bool) -> Result<(), anyhow::Error> {
    let members = chat.members().await?;
    let mut rows = Vec::with_capacity(members.len());
    for member in &members {
        rows.push(json!({
            "user_id": member.id().to_string(),
            "nickname": member.nickname().await?,
            "is_online": member.is_online().await?,
        }));
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        info!("{} member(s) in {}", rows.len(), chat.channel_url());
        for row in rows {
            println!(
                "{:<32} {}",
                row["user_id"].as_str().unwrap_or_default(),
                row["nickname"].as_str().unwrap_or("-")
            );
        }
    }
    Ok(())
}
