mod logging;

use ampere_client::{
    ApiConfig, Gateway, StreamHandlers, StreamReconnector, StreamUrl, SubscribeOptions,
    TokenAccessor, VisibilitySignal, set_global_config, token_accessor,
};
use clap::{Parser, Subcommand};
use reqwest::Url;
use serde_json::Value;
use std::io::Write;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(name = "ampere-cli")]
#[command(about = "Command-line host for the Ampere client runtime")]
struct Cli {
    /// Overrides AMPERE_API_ORIGIN.
    #[arg(long, global = true)]
    origin: Option<String>,
    /// Overrides AMPERE_API_BASE_PATH.
    #[arg(long, global = true)]
    base_path: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(subcommand)]
    Stations(StationsCommand),
    #[command(subcommand)]
    Session(SessionCommand),
    #[command(subcommand)]
    Feed(FeedCommand),
}

#[derive(Subcommand, Debug)]
enum StationsCommand {
    List,
    Get { id: String },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
    Get { id: String },
    /// Print session updates until interrupted.
    Watch { id: String },
}

#[derive(Subcommand, Debug)]
enum FeedCommand {
    /// Print realtime feed events until interrupted.
    Watch,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
    logging::init();

    let cli = Cli::parse();
    let result = match configure(cli.origin.as_deref(), cli.base_path.as_deref()) {
        Ok(()) => run(cli.command).await,
        Err(error) => Err(error),
    };

    match result {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(1)
        }
    }
}

fn configure(origin: Option<&str>, base_path: Option<&str>) -> Result<(), String> {
    if origin.is_none() && base_path.is_none() {
        return Ok(());
    }
    let env = ApiConfig::from_env();
    let origin = match origin {
        Some(origin) => {
            Url::parse(origin).map_err(|error| format!("--origin {origin}: {error}"))?
        }
        None => env.origin.clone(),
    };
    let base_path = base_path.unwrap_or(&env.base_path);
    let config = ApiConfig {
        request_timeout: env.request_timeout,
        connect_timeout: env.connect_timeout,
        ..ApiConfig::new(origin, base_path)
    };
    set_global_config(config).map_err(|error| error.to_string())
}

/// Token from `AMPERE_TOKEN`, re-read on every call so rotation is picked up.
fn env_token() -> TokenAccessor {
    token_accessor(|| std::env::var("AMPERE_TOKEN").ok())
}

async fn run(command: Commands) -> Result<ExitCode, String> {
    let gateway = Gateway::new(env_token()).map_err(|error| error.to_string())?;
    match command {
        Commands::Stations(StationsCommand::List) => {
            print_result(gateway.stations().list().await)
        }
        Commands::Stations(StationsCommand::Get { id }) => {
            print_result(gateway.stations().by_id(&id).await)
        }
        Commands::Session(SessionCommand::Get { id }) => {
            print_result(gateway.sessions().get(&id).await)
        }
        Commands::Session(SessionCommand::Watch { id }) => {
            let url = gateway
                .sessions()
                .events(&id)
                .map_err(|error| error.to_string())?;
            watch(url).await
        }
        Commands::Feed(FeedCommand::Watch) => {
            let url = gateway.realtime().feed().map_err(|error| error.to_string())?;
            watch(url).await
        }
    }
}

fn print_result<T: serde::Serialize>(
    result: ampere_client::ApiResult<Option<T>>,
) -> Result<ExitCode, String> {
    match result {
        Ok(Some(value)) => {
            print_json_line(&serde_json::to_value(value).map_err(|error| error.to_string())?);
            Ok(ExitCode::SUCCESS)
        }
        Ok(None) => Ok(ExitCode::SUCCESS),
        Err(error) if error.is_http() => {
            eprintln!("error: {error}");
            Ok(ExitCode::from(2))
        }
        Err(error) => Err(error.to_string()),
    }
}

fn print_json_line(value: &Value) {
    let mut stdout = std::io::stdout().lock();
    let _ = writeln!(stdout, "{value}");
    let _ = stdout.flush();
}

async fn watch(url: StreamUrl) -> Result<ExitCode, String> {
    let reconnector = StreamReconnector::sse(ApiConfig::global(), VisibilitySignal::always_visible())
        .map_err(|error| error.to_string())?;
    tracing::info!(url = %url.base(), "watching stream, press Ctrl-C to stop");

    let handlers = StreamHandlers::new(|event: Value| print_json_line(&event))
        .on_open(|| tracing::info!("stream connected"))
        .on_error(|error| tracing::warn!(%error, "stream interrupted"));
    let subscription = reconnector.subscribe(url, handlers, SubscribeOptions::default());

    tokio::signal::ctrl_c()
        .await
        .map_err(|error| error.to_string())?;
    subscription.unsubscribe();
    tracing::info!(dropped = subscription.dropped_messages(), "stream watch ended");
    Ok(ExitCode::SUCCESS)
}
