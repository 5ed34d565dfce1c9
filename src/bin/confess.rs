// `confess` - command-line client for the confessions API.

use clap::{Parser, Subcommand};
use confessions::core::confessions::{Comment, Confession, ConfessionSort};
use confessions::core::identity::IdentityProvider;
use confessions::core::moderation::{LexicalFilter, DEFAULT_BANNED_TERMS};
use confessions::infra::client::ConfessionsApiClient;
use confessions::infra::identity::FileIdentityProvider;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "confess", about = "Share and browse anonymous confessions")]
struct Cli {
    /// Base URL of the confessions API.
    #[arg(long, global = true, env = "CONFESSIONS_URL", default_value = "http://127.0.0.1:8080")]
    url: String,

    /// File holding this client's anonymous identity.
    #[arg(long, global = true, env = "CONFESSIONS_IDENTITY_FILE", default_value = "data/identity")]
    identity_file: PathBuf,

    /// Print raw JSON instead of text.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List confessions.
    List {
        /// recent, popular or trending.
        #[arg(long, default_value = "recent")]
        sort: ConfessionSort,
    },
    /// Submit a new confession.
    Submit { content: String },
    /// Like a confession, or remove your like.
    Like { id: String },
    /// Comment on a confession.
    Comment { id: String, content: String },
    /// Show the comments on a confession.
    Comments { id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let client = ConfessionsApiClient::new(&cli.url, LexicalFilter::new(DEFAULT_BANNED_TERMS))?;

    match cli.command {
        Command::List { sort } => {
            let confessions = client.list(sort).await?;
            if cli.json {
                return print_json(&confessions);
            }
            if confessions.is_empty() {
                println!("No confessions yet.");
            }
            let identity = FileIdentityProvider::new(&cli.identity_file).get_or_create_identity();
            for confession in &confessions {
                let mine = confession.liked_by.contains(&identity);
                print_confession(confession, mine);
            }
        }
        Command::Submit { content } => {
            let confession = client.submit(&content).await?;
            if cli.json {
                return print_json(&confession);
            }
            println!("Posted {}", confession.id);
        }
        Command::Like { id } => {
            let identity = FileIdentityProvider::new(&cli.identity_file);
            let confession = client.toggle_like(&id, &identity).await?;
            if cli.json {
                return print_json(&confession);
            }
            let mine = confession
                .liked_by
                .contains(&identity.get_or_create_identity());
            println!(
                "{} {} ({} likes)",
                if mine { "Liked" } else { "Unliked" },
                confession.id,
                confession.likes
            );
        }
        Command::Comment { id, content } => {
            let comment = client.add_comment(&id, &content).await?;
            if cli.json {
                return print_json(&comment);
            }
            println!("Commented on {}", comment.confession_id);
        }
        Command::Comments { id } => {
            let comments = client.list_comments(&id).await?;
            if cli.json {
                return print_json(&comments);
            }
            if comments.is_empty() {
                println!("No comments yet.");
            }
            for comment in &comments {
                print_comment(comment);
            }
        }
    }

    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_confession(confession: &Confession, mine: bool) {
    println!(
        "[{}] {}  {}{} likes, {} comments",
        confession.timestamp.format("%Y-%m-%d %H:%M"),
        confession.id,
        if mine { "* " } else { "" },
        confession.likes,
        confession.comment_count
    );
    println!("    {}", confession.content);
}

fn print_comment(comment: &Comment) {
    println!(
        "[{}] {}",
        comment.timestamp.format("%Y-%m-%d %H:%M"),
        comment.content
    );
}
