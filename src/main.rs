use anyhow::{bail, Context, Result};
use clap::Parser;
use repolens::chat::{ChatMessage, Conversation, THINKING_TEXT};
use repolens::config::Config;
use repolens::docs;
use repolens::github::{parse_repo_identifier, GitHubClient};
use repolens::repo::RepositoryContext;
use repolens::util::{group_digits, truncate};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "repolens",
    about = "Inspect a public GitHub repository and chat with it",
    version
)]
struct Args {
    /// Repository to analyze (owner/repo or a github.com URL)
    #[arg(required_unless_present = "init_config")]
    repo: Option<String>,

    /// Ask a question, print the answer and exit (repeatable)
    #[arg(short, long)]
    ask: Vec<String>,

    /// Print a generated README for the repository and exit
    #[arg(long)]
    readme: bool,

    /// Write the default config file (if none exists) and print its path
    #[arg(long)]
    init_config: bool,

    /// Log level used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let config = Config::load();
    if args.init_config {
        let exists = Config::config_path().is_some_and(|p| p.exists());
        if !exists {
            config.save()?;
        }
        println!("{}", Config::config_location());
        return Ok(());
    }
    let Some(repo) = args.repo.as_deref() else {
        bail!("a repository is required (owner/repo or a github.com URL)");
    };

    let client = Arc::new(GitHubClient::new(&config)?);
    let mut chat = Conversation::new(Duration::from_millis(config.thinking_delay_ms));

    let context = analyze(&client, repo).await?;
    if args.readme {
        print!("{}", docs::generate_readme(&context));
        return Ok(());
    }

    print_summary(&context);
    chat.load(context, client.clone());

    if !args.ask.is_empty() {
        let ids: Vec<_> = args.ask.iter().filter_map(|q| chat.submit(q)).collect();
        chat.settle().await;
        for id in ids {
            if let Some(message) = chat.message(id) {
                print_reply(message);
            }
        }
        return Ok(());
    }

    run_repl(&mut chat, &client).await
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn analyze(client: &GitHubClient, input: &str) -> Result<RepositoryContext> {
    let id = parse_repo_identifier(input).with_context(|| {
        format!(
            "'{}' is not a GitHub repository (expected owner/repo or a github.com URL)",
            input
        )
    })?;
    eprintln!("🔍 Analyzing {}...", id);
    client.analyze(&id).await
}

async fn run_repl(chat: &mut Conversation, client: &Arc<GitHubClient>) -> Result<()> {
    println!("Ask me about this repository. Type `help` for ideas, :view to open the last file, :analyze <repo> to switch, :quit to exit.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("\n> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let input = line.trim();

        match input {
            ":quit" | ":q" => return Ok(()),
            ":view" => match chat.last_action().cloned() {
                Some(action) => match chat.open(&action).await {
                    Ok(body) => {
                        println!("── {} ──", action.path);
                        println!("{}", body);
                    }
                    Err(e) => eprintln!("Error: {:#}", e),
                },
                None => println!("Nothing to view yet. Try \"find README.md\"."),
            },
            _ if input.starts_with(":analyze") => {
                let target = input.trim_start_matches(":analyze").trim();
                match analyze(client, target).await {
                    Ok(context) => {
                        print_summary(&context);
                        chat.load(context, client.clone());
                    }
                    Err(e) => eprintln!("Error: {:#}", e),
                }
            }
            _ => {
                let Some(id) = chat.submit(input) else {
                    continue;
                };
                eprintln!("  {}", THINKING_TEXT);
                chat.settle().await;
                if let Some(message) = chat.message(id) {
                    print_reply(message);
                }
            }
        }
    }
}

fn print_reply(message: &ChatMessage) {
    let at = message.sent_at.with_timezone(&chrono::Local);
    println!("[{}] {}", at.format("%H:%M:%S"), message.content);
    if let Some(action) = &message.action {
        println!("  [view file: {}] (type :view to open)", action.path);
    }
}

fn print_summary(ctx: &RepositoryContext) {
    let meta = ctx.metadata();

    println!();
    println!("┌─ {}", meta.name);
    if let Some(description) = &meta.description {
        println!("│  \"{}\"", truncate(description, 72));
    }
    println!("│");
    println!(
        "│  ★ {} stars  │  ⑂ {} forks  │  📄 {}",
        group_digits(meta.star_count),
        group_digits(meta.fork_count),
        meta.license.as_deref().unwrap_or("no license")
    );
    println!(
        "│  👤 {} ({})  │  🌿 {}  │  📁 {} files",
        meta.owner.login,
        meta.owner.profile_url,
        meta.default_branch,
        ctx.files().len()
    );

    let breakdown = ctx.language_breakdown();
    if !breakdown.is_empty() {
        let languages: Vec<String> = breakdown
            .iter()
            .take(5)
            .map(|s| format!("{} {:.1}%", s.name, s.percent))
            .collect();
        println!("│  {}", languages.join("  ·  "));
    }
    println!("└─────────────────────────────────────────────────────────");
}
