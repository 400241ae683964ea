//! Busylight - Entry Point
//!
//! Wires the light and Slack controllers together and drives them from
//! stdin commands or one-shot subcommands.

use anyhow::{bail, Context, Result};
use busylight::{
    cli::Command,
    core::{config::Config, events::AppEvent},
    hid::{HidLight, HidLinkMonitor, LightDevice},
    slack::{
        BrowserOpener, CallbackOutcome, FileTokenStore, SlackApi, SlackClient, SystemBrowser,
        TokenStore,
    },
    DndController, LightController, OAuthHandler, Session,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "busylight", about = "Luxafor status light with Slack Do Not Disturb sync")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Use an in-memory light instead of USB hardware
    #[cfg(feature = "mock-hid")]
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Drive the light and Slack from commands on stdin (default)
    Run,
    /// Open the Slack authorization page
    Login,
    /// Complete authorization with the callback URL delivered by the OS
    Activate { url: String },
    /// Remove the Slack integration
    Logout,
    /// Print the configuration
    Config {
        /// Print the commented default configuration instead
        #[arg(long)]
        default: bool,
    },
}

/// Slack side of the application
struct Slack {
    dnd: DndController,
    oauth: OAuthHandler,
}

impl Slack {
    fn new(config: &Config) -> Result<Self> {
        let store: Arc<dyn TokenStore> = Arc::new(FileTokenStore::open_default()?);
        let api: Arc<dyn SlackApi> =
            Arc::new(SlackClient::new(&config.slack).context("Failed to create Slack client")?);
        let session = Arc::new(Session::new(store));
        let browser: Arc<dyn BrowserOpener> = Arc::new(SystemBrowser);

        Ok(Self {
            dnd: DndController::new(Arc::clone(&api), Arc::clone(&session), &config.slack),
            oauth: OAuthHandler::new(api, session, browser, &config.slack),
        })
    }
}

/// Build the light controller for real hardware
fn hid_light(config: &Config) -> Result<LightController> {
    let light = HidLight::new(&config.light)?;
    let monitor = HidLinkMonitor::new(light.clone(), config.light.poll_interval());
    let device: Arc<dyn LightDevice> = Arc::new(light);
    Ok(LightController::new(device, Box::new(monitor), &config.light))
}

/// Build the light controller around a mock light that is already plugged in
#[cfg(feature = "mock-hid")]
fn mock_light(config: &Config) -> (LightController, busylight::hid::mock::MockLink) {
    use busylight::hid::mock::{MockLight, MockLinkMonitor};

    let light = MockLight::new();
    let monitor = MockLinkMonitor::new(Arc::clone(&light));
    let link = monitor.link();
    (LightController::new(light, Box::new(monitor), &config.light), link)
}

fn print_event(event: &AppEvent) {
    match event {
        AppEvent::LightConnectivityChanged { connected } => {
            println!("light {}", if *connected { "connected" } else { "disconnected" });
        }
        AppEvent::SessionStateChanged { logged_in } => {
            println!("slack {}", if *logged_in { "logged in" } else { "logged out" });
        }
        AppEvent::AuthorizationSucceeded { team_name } => {
            println!("Slack integration added; Do Not Disturb will be published to '{}'", team_name);
        }
        AppEvent::AuthorizationFailed { message } => {
            println!("Slack authentication failed: {}", message);
        }
    }
}

fn drain_events(events: &mut mpsc::UnboundedReceiver<AppEvent>) {
    while let Ok(event) = events.try_recv() {
        print_event(&event);
    }
}

/// Apply one stdin command; returns false to stop
fn apply(command: Command, light: &LightController, slack: &Slack) -> bool {
    match command {
        Command::Color(color) => light.set_color(color),
        Command::Brightness(brightness) => light.set_brightness(brightness),
        Command::Dim(dimmed) => light.set_dimmed(dimmed),
        Command::Speed(speed) => light.set_transition_speed(speed),
        Command::Snooze(snoozed) => {
            if slack.dnd.set_snoozed(snoozed).is_none() && !slack.dnd.is_logged_in() {
                println!("not logged in to Slack");
            }
        }
        Command::Login => match slack.oauth.begin_authorization() {
            Ok(url) => println!("opened {}", url),
            Err(e) => println!("cannot start authorization: {}", e),
        },
        Command::Activate(url) => {
            if let CallbackOutcome::Ignored = slack.oauth.handle_redirect(&url) {
                println!("not an activation URL");
            }
        }
        Command::Logout => slack.dnd.remove_integration(),
        Command::Status => {
            let desired = light.desired_state();
            println!(
                "light: {:?}, color: {}, brightness: {}",
                light.connection_state(),
                desired.color.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string()),
                desired.brightness.map(|b| b.to_string()).unwrap_or_else(|| "-".to_string()),
            );
            println!(
                "slack: logged_in={}, dnd={}, auth={:?}",
                slack.dnd.is_logged_in(),
                slack.dnd.snooze_state(),
                slack.oauth.phase()
            );
        }
        Command::Quit => return false,
    }
    true
}

async fn run(light: LightController, slack: Slack) -> Result<()> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();

    if let Err(e) = light.attach(event_tx.clone()) {
        warn!("Light unavailable: {}", e);
    }
    slack.dnd.attach(event_tx)?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => print_event(&event),
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match line.parse::<Command>() {
                    Ok(command) => {
                        if !apply(command, &light, &slack) {
                            break;
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    light.detach();
    slack.dnd.detach();
    info!("Shutting down");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            info!("Starting busylight");
            let slack = Slack::new(&config)?;

            #[cfg(feature = "mock-hid")]
            if cli.mock {
                let (light, link) = mock_light(&config);
                let handle = tokio::spawn(async move {
                    // Give `run` a moment to attach before plugging in
                    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
                    link.plug();
                });
                let result = run(light, slack).await;
                handle.abort();
                return result;
            }

            let light = hid_light(&config)?;
            run(light, slack).await?;
        }
        Commands::Login => {
            let slack = Slack::new(&config)?;
            let url = slack.oauth.begin_authorization()?;
            println!("Opened {}", url);
            println!("Finish by running: busylight activate <callback-url>");
        }
        Commands::Activate { url } => {
            let slack = Slack::new(&config)?;
            let (event_tx, mut event_rx) = mpsc::unbounded_channel();
            slack.dnd.attach(event_tx)?;
            let _ = event_rx.try_recv();

            match slack.oauth.handle_redirect(&url) {
                CallbackOutcome::Exchanging(handle) => {
                    if let Err(e) = handle.await {
                        error!("Exchange task failed: {}", e);
                    }
                }
                CallbackOutcome::Ignored => bail!("not an activation URL: {}", url),
                CallbackOutcome::Rejected | CallbackOutcome::Busy => {}
            }
            drain_events(&mut event_rx);
        }
        Commands::Logout => {
            let slack = Slack::new(&config)?;
            let (event_tx, mut event_rx) = mpsc::unbounded_channel();
            slack.dnd.attach(event_tx)?;
            let _ = event_rx.try_recv();
            slack.dnd.remove_integration();
            drain_events(&mut event_rx);
        }
        Commands::Config { default } => {
            if default {
                print!("{}", Config::default_config_str());
            } else {
                print!("{}", toml::to_string_pretty(&config).context("Failed to serialize config")?);
            }
        }
    }

    Ok(())
}
