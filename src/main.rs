use std::sync::Arc;

use thiserror::Error;

use crate::api::server::{AppState, ServerErr};
use crate::db::prelude::{PgError, PgStore, Store};
use crate::util::env::{EnvErr, Var};
use crate::util::openai::{CompletionClient, CompletionErr};
use crate::util::telemetry;
use crate::workflow::feed::TrackerFeed;
use crate::workflow::platform::PlatformRegistry;

mod api;
mod args;
mod constants;
mod db;
mod util;
mod workflow;

#[derive(Debug, Error)]
enum RunnerErr {
    #[error(transparent)]
    Std(#[from] Box<dyn std::error::Error>),

    #[error(transparent)]
    Env(#[from] EnvErr),

    #[error(transparent)]
    Db(#[from] PgError),

    #[error(transparent)]
    Completion(#[from] CompletionErr),

    #[error(transparent)]
    Server(#[from] ServerErr),

    #[error("invalid SERVER_API_PORT '{0}'")]
    Port(String),
}

type Result<T> = core::result::Result<T, RunnerErr>;

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry_registry = telemetry::Telemetry::new().await?.register();
    let args = args::parse_cli_args();

    tracing::info!("starting reviewhub server");

    let result = run(args).await;
    if let Err(e) = &result {
        tracing::error!(error = ?e, "server exited with error");
    }

    telemetry_registry.shutdown();
    result
}

async fn run(args: args::Cli) -> Result<()> {
    let pool = db::connect().await?;
    if args.migrate {
        db::migrate(&pool).await?;
    }

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    let platforms = PlatformRegistry::load(store.as_ref()).await?;
    let completer = CompletionClient::from_env().await?;
    tracing::info!(model = completer.model(), "completion client ready");

    let state = Arc::new(AppState {
        store,
        completer: Arc::new(completer),
        platforms: Arc::new(platforms),
        feed: TrackerFeed::default(),
    });

    let port = match args.port {
        Some(port) => port,
        None => {
            let raw = var!(Var::ServerApiPort).await?;
            raw.parse::<u16>()
                .map_err(|_| RunnerErr::Port(raw.to_string()))?
        }
    };

    api::server::start_server(state, port).await?;
    Ok(())
}
