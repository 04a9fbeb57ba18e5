//! schedulo - command line front-end for the assignment dashboard.
//!
//! Runs the session bootstrapper once per invocation: restores the stored
//! session, applies the requested action (sign-in, sign-out), waits for the
//! profile and assignment fetches to finish and writes the rendered page.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schedulo_core::api::ApiClient;
use schedulo_core::auth::{CredentialResponder, GoogleIdentity};
use schedulo_core::cache::CacheManager;
use schedulo_core::login::{LogSubmitHandler, LoginForm};
use schedulo_core::view::{render_document, FileTarget, MemoryTarget, RenderTarget};
use schedulo_core::{Bootstrapper, Config, Services, SessionState};

// ============================================================================
// Constants
// ============================================================================

/// File name prefix for the rolling log file
const LOG_FILE_PREFIX: &str = "schedulo.log";

// ============================================================================
// Command line
// ============================================================================

#[derive(Parser)]
#[command(name = "schedulo")]
#[command(about = "Assignment dashboard with Google sign-in")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Dashboard API base URL (overrides config)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Write the rendered page to this file (overrides config)
    #[arg(long, short = 'o', global = true)]
    output: Option<PathBuf>,

    /// Print the rendered page to stdout instead of writing a file
    #[arg(long, global = true, conflicts_with = "output")]
    stdout: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the dashboard for the stored session
    Render,
    /// Complete an external sign-in with the credential it produced
    SignIn {
        /// Credential token; read from stdin when omitted
        token: Option<String>,
    },
    /// Forget the stored credential and render the signed-out dashboard
    SignOut,
    /// Interactive name/password login form
    Login {
        /// Prefill the name field
        #[arg(long)]
        name: Option<String>,
    },
    /// Show whether a credential is stored and how old the cached assignments are
    Status,
    /// Print the effective configuration
    Config {
        /// Also write it to the configuration file
        #[arg(long)]
        save: bool,
    },
}

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr, filtered by `RUST_LOG` (default `warn`). With a log
/// directory configured, they are also written to a daily-rolling file; the
/// returned guard must be held until exit so buffered lines are flushed.
fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let (config, config_path) = load_config(&cli)?;

    let _log_guard = init_tracing(config.log_dir.as_deref());
    info!("schedulo starting");

    match cli.command {
        Commands::Render => render(&cli, &config).await,
        Commands::SignIn { ref token } => sign_in(&cli, &config, token.clone()).await,
        Commands::SignOut => sign_out(&cli, &config).await,
        Commands::Login { ref name } => login(name.as_deref()),
        Commands::Status => status(&config),
        Commands::Config { save } => show_config(&config, &config_path, save),
    }
}

/// Config file, then environment, then command line flags.
fn load_config(cli: &Cli) -> Result<(Config, PathBuf)> {
    let path = match cli.config {
        Some(ref path) => path.clone(),
        None => Config::config_path()?,
    };

    let mut config = Config::load_from(&path)?;
    config.apply_env();

    if let Some(ref url) = cli.api_url {
        config.api_base_url = url.clone();
    }
    if let Some(ref output) = cli.output {
        config.output = Some(output.clone());
    }

    Ok((config, path))
}

// ============================================================================
// Bootstrapper wiring
// ============================================================================

/// Where rendered pages go. Stdout pages are buffered and printed once settled.
enum Output {
    File,
    Stdout(MemoryTarget),
}

fn output_target(cli: &Cli, config: &Config) -> (Box<dyn RenderTarget>, Output) {
    match config.output {
        Some(ref path) if !cli.stdout => (Box::new(FileTarget::new(path.clone())), Output::File),
        _ => {
            let memory = MemoryTarget::new();
            (Box::new(memory.clone()), Output::Stdout(memory))
        }
    }
}

fn build_bootstrapper(
    config: &Config,
    target: Box<dyn RenderTarget>,
) -> Result<(Bootstrapper, CredentialResponder)> {
    let cache_dir = config.cache_dir()?;
    let api = Arc::new(ApiClient::new(&config.profile_url, &config.api_base_url)?);

    let identity = GoogleIdentity::new();
    let responder = identity.responder();

    let client_id = match config.client_id {
        Some(ref id) => id.clone(),
        None => {
            warn!("No client_id configured; the sign-in control will not work in a browser");
            String::new()
        }
    };

    let boot = Bootstrapper::new(
        &client_id,
        Services {
            credentials: config.credential_backend.open(&cache_dir),
            identity: Box::new(identity),
            profiles: api.clone(),
            assignments: api,
            target,
        },
        config.render_options(),
    );

    let boot = match CacheManager::new(cache_dir) {
        Ok(cache) => boot.with_cache(cache),
        Err(e) => {
            warn!(error = %e, "Assignment cache unavailable");
            boot
        }
    };

    Ok((boot, responder))
}

fn finish(output: Output, config: &Config) {
    match output {
        Output::Stdout(memory) => {
            if let Some(page) = memory.latest() {
                println!("{}", render_document(&page));
            }
        }
        Output::File => {
            if let Some(ref path) = config.output {
                eprintln!("Dashboard written to {}", path.display());
            }
        }
    }
}

fn report_session(boot: &Bootstrapper) {
    match (boot.state(), boot.session()) {
        (SessionState::SignedIn, Some(session)) => eprintln!("Signed in as {}", session.display_name),
        (SessionState::SignedOut, _) => eprintln!(
            "Signed out. Sign in from the page, then pass the credential it shows to `schedulo sign-in`."
        ),
        (state, _) => eprintln!("Session: {}", state),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn render(cli: &Cli, config: &Config) -> Result<()> {
    let (target, output) = output_target(cli, config);
    let (mut boot, _) = build_bootstrapper(config, target)?;

    boot.start();
    boot.run_until_settled().await;

    report_session(&boot);
    finish(output, config);
    Ok(())
}

async fn sign_in(cli: &Cli, config: &Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => read_line("Credential: ")?,
    };
    let token = token.trim().to_string();
    if token.is_empty() {
        anyhow::bail!("No credential given");
    }

    let (target, output) = output_target(cli, config);
    let (mut boot, responder) = build_bootstrapper(config, target)?;

    boot.start();
    if !responder.respond(token) {
        anyhow::bail!("The credential could not be delivered to the session");
    }
    boot.run_until_settled().await;

    report_session(&boot);
    finish(output, config);

    if !boot.state().is_signed_in() {
        anyhow::bail!("Sign-in failed: the profile could not be fetched");
    }
    Ok(())
}

async fn sign_out(cli: &Cli, config: &Config) -> Result<()> {
    let (target, output) = output_target(cli, config);
    let (mut boot, _) = build_bootstrapper(config, target)?;

    boot.start();
    let handle = boot.handle();
    if !handle.sign_out().await {
        anyhow::bail!("Session loop is not running");
    }
    boot.run_until_settled().await;

    eprintln!("Signed out");
    finish(output, config);
    Ok(())
}

fn login(name: Option<&str>) -> Result<()> {
    let name = match name {
        Some(name) => name.to_string(),
        None => read_line("Name: ")?,
    };

    let mut form = LoginForm::with_name(name.trim());
    let password = rpassword::prompt_password("Password: ")
        .context("Failed to read password")?;
    form.set_password(&password);

    form.submit(&LogSubmitHandler)?;

    if let Some(greeting) = form.greeting() {
        println!("{}", greeting);
    }
    Ok(())
}

fn status(config: &Config) -> Result<()> {
    let cache_dir = config.cache_dir()?;

    let credentials = config.credential_backend.open(&cache_dir);
    match credentials.load() {
        Ok(Some(_)) => println!("Credential: stored ({:?} backend)", config.credential_backend),
        Ok(None) => println!("Credential: none"),
        Err(e) => println!("Credential: unreadable ({})", e),
    }

    let cache = CacheManager::new(cache_dir)?;
    match cache.load_assignments() {
        Ok(Some(cached)) => println!(
            "Assignments: {} cached, updated {}",
            cached.data.len(),
            cached.age_display()
        ),
        Ok(None) => println!("Assignments: never fetched"),
        Err(e) => println!("Assignments: cache unreadable ({})", e),
    }
    Ok(())
}

fn show_config(config: &Config, path: &Path, save: bool) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    if save {
        config.save_to(path)?;
        eprintln!("Saved to {}", path.display());
    }
    Ok(())
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().lock().read_line(&mut input)?;
    Ok(input.trim().to_string())
}
