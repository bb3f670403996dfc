mod config;

use std::sync::Arc;

use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use satchel_bot::Bot;
use satchel_bot::translate::HttpTranslator;
use satchel_gateway::connection;
use satchel_gateway::dispatcher::Dispatcher;
use satchel_store::Store;

use crate::config::{Config, DEV_JWT_SECRET};

#[derive(Clone)]
struct ServerState {
    dispatcher: Dispatcher,
    bot: Arc<Bot>,
    jwt_secret: Arc<str>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "satchel=debug,satchel_bot=debug,satchel_gateway=debug,tower_http=debug".into()
            }),
        )
        .init();

    let config = Config::from_env()?;
    if config.jwt_secret == DEV_JWT_SECRET {
        warn!("SATCHEL_JWT_SECRET is not set, using the development secret");
    }

    // Storage
    let store = Arc::new(Store::open(&config.data_dir)?);

    // Shared state
    let translator = HttpTranslator::new(&config.translate_url, config.translate_api_key.clone())?;
    let dispatcher = Dispatcher::new();
    let bot = Arc::new(Bot::new(
        store,
        dispatcher.clone(),
        Arc::new(translator),
        config.timer_unit,
    ));
    info!("Translation service at {}", config.translate_url);

    let state = ServerState {
        dispatcher,
        bot,
        jwt_secret: Arc::from(config.jwt_secret.as_str()),
    };

    let app = Router::new()
        .route("/gateway", get(ws_upgrade))
        .route("/health", get(health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr = config.addr()?;
    info!("Satchel listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn ws_upgrade(State(state): State<ServerState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        connection::handle_connection(socket, state.dispatcher, state.bot, state.jwt_secret)
    })
}

async fn health() -> &'static str {
    "ok"
}
