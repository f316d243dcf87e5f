// offline-shell - drive the offline cache agent from the command line.
// Each subcommand delivers one host event to the agent over an on-disk cache store.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use offline_shell::cache::DiskCacheStorage;
use offline_shell::host::HeadlessHost;
use offline_shell::network::HttpFetcher;
use offline_shell::platform::{
    CacheStorage, Notification, NotificationClick, PushMessage, Request,
};
use offline_shell::{
    AgentConfig, AgentError, AgentEvent, CacheAgent, EventOutcome, FetchOutcome, Result, dispatch,
    logging,
};

#[derive(Parser)]
#[command(name = "offline-shell", version, about = "Offline cache agent for the NABS Radio shell")]
struct Cli {
    /// JSON configuration file
    #[arg(long, env = "OFFLINE_SHELL_CONFIG")]
    config: Option<PathBuf>,

    /// Override the cache directory
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Precache the shell assets into the current cache generation
    Install,
    /// Delete caches from previous versions
    Activate,
    /// Intercept a request and print the response
    Fetch {
        url: String,
        /// Treat the request as a top-level page navigation
        #[arg(long)]
        navigate: bool,
    },
    /// Simulate a push message
    Push { text: Option<String> },
    /// Simulate a click on a notification action
    Click {
        #[arg(default_value = "play")]
        action: String,
    },
    /// Fire a background sync event
    Sync { tag: String },
    /// Fire a periodic sync event
    PeriodicSync { tag: String },
    /// List cache generations
    Caches,
}

type Agent = CacheAgent<DiskCacheStorage, HttpFetcher, HeadlessHost>;

fn build_agent(cli: &Cli) -> Result<Agent> {
    let mut config = AgentConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.cache_dir {
        config.cache_dir = Some(dir.clone());
    }

    let storage = match &config.cache_dir {
        Some(dir) => DiskCacheStorage::new(dir),
        None => DiskCacheStorage::in_default_location()
            .ok_or_else(|| AgentError::Config("no cache directory available".to_string()))?,
    };
    tracing::debug!(root = %storage.root().display(), "Using cache store");

    let fetcher = HttpFetcher::from_config(&config)?;
    Ok(CacheAgent::new(config, storage, fetcher, HeadlessHost::new()))
}

fn event_for(agent: &Agent, cmd: &Command) -> Option<AgentEvent> {
    let event = match cmd {
        Command::Install => AgentEvent::Install,
        Command::Activate => AgentEvent::Activate,
        Command::Fetch { url, navigate } => {
            let request = if *navigate {
                Request::navigate(url.clone())
            } else {
                Request::get(url.clone())
            };
            AgentEvent::Fetch(request)
        }
        Command::Push { text } => AgentEvent::Push(match text {
            Some(text) => PushMessage::text(text.clone()),
            None => PushMessage::empty(),
        }),
        Command::Click { action } => {
            // The CLI has no live notification, so click a freshly built one
            let notification = Notification {
                title: agent.config().notification.title.clone(),
                options: agent.notification_options(&PushMessage::empty()),
            };
            AgentEvent::NotificationClick(NotificationClick {
                notification,
                action: action.clone(),
            })
        }
        Command::Sync { tag } => AgentEvent::Sync { tag: tag.clone() },
        Command::PeriodicSync { tag } => AgentEvent::PeriodicSync { tag: tag.clone() },
        Command::Caches => return None,
    };
    Some(event)
}

fn print_response(outcome: &FetchOutcome) -> Result<()> {
    match outcome {
        FetchOutcome::PassThrough => println!("pass-through (not intercepted)"),
        FetchOutcome::Respond(response) => {
            eprintln!("HTTP {} {}", response.status, response.url);
            std::io::stdout().write_all(&response.body)?;
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<bool> {
    let agent = build_agent(&cli)?;

    let Some(event) = event_for(&agent, &cli.cmd) else {
        let current = agent.cache_name();
        for name in agent.storage().keys().await? {
            let marker = if name == current { "*" } else { " " };
            println!("{} {}", marker, name);
        }
        return Ok(true);
    };

    let outcome = dispatch(&agent, event).await;
    match &outcome {
        EventOutcome::Completed => {}
        EventOutcome::Activated(deleted) => {
            for name in deleted {
                println!("deleted {}", name);
            }
        }
        EventOutcome::Fetch(fetch) => print_response(fetch)?,
        EventOutcome::Failed(e) => eprintln!("error: {}", e),
    }
    Ok(!outcome.is_failed())
}

#[tokio::main]
async fn main() -> ExitCode {
    logging::init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
