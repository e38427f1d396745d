use std::{sync::Arc, time::Duration};

use axum::{Json, Router, extract::State, routing::get};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tower_http::trace::TraceLayer;

use crate::{
    config::{GatewayConfig, HelloConfig, WorldConfig},
    error::GatewayError,
};

const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Greeting {
    pub greeting: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Name {
    pub name: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

pub async fn health_handler() -> &'static str {
    "ok"
}

// ─── hello-service ─────────────────────────────────────────────────────────

pub fn hello_router(config: HelloConfig) -> Router {
    Router::new()
        .route("/greet", get(greet_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

async fn greet_handler(State(config): State<Arc<HelloConfig>>) -> Json<Greeting> {
    Json(Greeting {
        greeting: config.greeting.clone(),
    })
}

// ─── world-service ─────────────────────────────────────────────────────────

pub fn world_router(config: WorldConfig) -> Router {
    Router::new()
        .route("/name", get(name_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(config))
}

async fn name_handler(State(config): State<Arc<WorldConfig>>) -> Json<Name> {
    Json(Name {
        name: config.name.clone(),
    })
}

// ─── gateway ───────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct GatewayState {
    client: reqwest::Client,
    config: Arc<GatewayConfig>,
}

impl GatewayState {
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(UPSTREAM_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }
}

pub fn gateway_router(state: GatewayState) -> Router {
    Router::new()
        .route("/hello-world", get(hello_world_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Both upstreams are queried concurrently; the first failure wins.
async fn hello_world_handler(
    State(state): State<GatewayState>,
) -> Result<Json<Message>, GatewayError> {
    let (hello, world) = tokio::try_join!(
        fetch::<Greeting>(&state.client, "hello", &state.config.hello_url),
        fetch::<Name>(&state.client, "world", &state.config.world_url),
    )?;
    Ok(Json(Message {
        message: format!("{} {}", hello.greeting, world.name),
    }))
}

async fn fetch<T: DeserializeOwned>(
    client: &reqwest::Client,
    service: &'static str,
    url: &str,
) -> Result<T, GatewayError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|source| GatewayError::Unreachable { service, source })?;

    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Status { service, status });
    }

    response
        .json()
        .await
        .map_err(|source| GatewayError::Malformed { service, source })
}
