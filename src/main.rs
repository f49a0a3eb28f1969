//! GitHub CI/CD demo web service entry point.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use github_cicd_demo::api::{create_router, AppState};
use github_cicd_demo::build_info::BuildInfo;
use github_cicd_demo::config::{is_managed_dev_env, locate, Config, EnvFilePolicy, ProcessEnv};
use github_cicd_demo::utils::shutdown_signal;
use github_cicd_demo::{metrics, telemetry};

/// Demo web service that reports build and deploy metadata.
#[derive(Parser, Debug)]
#[command(name = "github-cicd-demo")]
#[command(about = "Demo web service that reports build and deploy metadata")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Env file loaded when not running in Codespaces. Relative paths are
    /// looked up in the working directory, then next to the executable.
    #[arg(long, global = true, env = "ENV_FILE", default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the current build info as JSON.
    Info,
}

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Resolve configuration sources before anything reads the environment
    let policy = EnvFilePolicy::resolve(&ProcessEnv, locate(&args.env_file));
    let env_file_loaded = policy.apply()?;
    let mut config = Config::from_env()?;
    config.static_dir = locate(&config.static_dir);

    let port_override = match &args.command {
        Some(Command::Serve { port }) => port.or(args.port),
        _ => args.port,
    };
    if let Some(port) = port_override {
        config.port = port;
    }

    // Initialize logging
    telemetry::init_logging(&config, args.verbose);

    match &policy {
        EnvFilePolicy::Skip => info!("Managed dev environment detected, env file skipped"),
        EnvFilePolicy::Load(path) if env_file_loaded => {
            info!("Loaded environment from {}", path.display())
        }
        EnvFilePolicy::Load(path) => debug!("No env file at {}", path.display()),
    }

    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::Info) => cmd_info(&config),
        Some(Command::Serve { .. }) | None => cmd_serve(config),
    }
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("GITHUB CI/CD DEMO - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Checking Sentry DSN... ");
    match telemetry::parse_dsn(config) {
        Ok(Some(dsn)) => println!("OK ({})", dsn.host()),
        Ok(None) => println!("not set"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Port: {}", config.port);
    println!("  Static Dir: {}", config.static_dir.display());
    println!(
        "  Metrics Port: {}",
        config
            .metrics_port
            .map_or_else(|| "disabled".to_string(), |p| p.to_string())
    );
    println!("  Log Format: {}", if config.log_json { "json" } else { "text" });
    println!("  Codespaces: {}", is_managed_dev_env(&ProcessEnv));
    println!("  Sentry Enabled: {}", config.sentry_enabled());
    println!("  Traces Sample Rate: {}", config.sentry_traces_sample_rate);
    if let Some(environment) = &config.sentry_environment {
        println!("  Sentry Environment: {}", environment);
    }
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the current build info as JSON.
fn cmd_info(config: &Config) -> anyhow::Result<()> {
    let info = BuildInfo::current(&ProcessEnv, config.sentry_enabled());
    println!("{}", serde_json::to_string_pretty(&info)?);
    Ok(())
}

/// Run the web server.
fn cmd_serve(config: Config) -> anyhow::Result<()> {
    // The Sentry guard has to outlive the runtime so pending events get flushed
    let sentry_guard = telemetry::init_sentry(&config).map_err(|e| {
        error!("Failed to initialize Sentry: {}", e);
        e
    })?;
    let sentry_enabled = sentry_guard.is_some();

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(serve(config, sentry_enabled))
}

async fn serve(config: Config, sentry_enabled: bool) -> anyhow::Result<()> {
    // Initialize metrics
    metrics::init_metrics();
    if let Some(metrics_port) = config.metrics_port {
        let addr = SocketAddr::from(([0, 0, 0, 0], metrics_port));
        metrics::install_exporter(addr)?;
        info!("Prometheus exporter listening on {}", addr);
    }

    let app_state = AppState::new(sentry_enabled)?;
    let router = create_router(app_state, &config.static_dir);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;
    info!("Starting server on port {}", config.port);
    info!("Sentry enabled: {}", sentry_enabled);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
