mod entity;
mod error;
mod handlers;
mod prelude;
mod state;
mod sv;

use std::{env, net::SocketAddr};

use axum::{
  Router,
  routing::{get, post},
};
use tower::ServiceBuilder;
use tower_governor::{GovernorLayer, governor::GovernorConfigBuilder};
use tower_http::{
  cors::{Any, CorsLayer},
  trace::TraceLayer,
};
use tracing_subscriber::{
  EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use crate::{prelude::*, state::AppState};

#[tokio::main]
async fn main() {
  dotenvy::dotenv().ok();

  tracing_subscriber::registry()
    .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
      "reseller=debug,tower_http=debug,axum=trace,sea_orm=warn".into()
    }))
    .with(tracing_subscriber::fmt::layer())
    .init();

  let db_url = env::var("DATABASE_URL")
    .unwrap_or_else(|_| "sqlite:reseller.db?mode=rwc".into());
  let op_timeout = env::var("OP_TIMEOUT_MS")
    .ok()
    .and_then(|ms| ms.parse().ok())
    .map(Duration::from_millis)
    .unwrap_or_else(|| Duration::from_millis(5000));

  info!("Starting reseller hierarchy server v{}", env!("CARGO_PKG_VERSION"));

  let app_state = Arc::new(AppState::new(&db_url, op_timeout).await);

  let governor_conf = Arc::new(
    GovernorConfigBuilder::default()
      .per_second(2)
      .burst_size(100)
      .finish()
      .expect("Failed to build rate limiter config"),
  );

  let governor_limiter = governor_conf.limiter().clone();

  tokio::spawn(async move {
    loop {
      tokio::time::sleep(Duration::from_secs(60)).await;
      governor_limiter.retain_recent();
    }
  });

  let app = Router::new()
    .route("/api/accounts", post(handlers::create_account))
    .route(
      "/api/accounts/{id}",
      get(handlers::get_account)
        .patch(handlers::update_account)
        .delete(handlers::delete_account),
    )
    .route("/api/accounts/{id}/status", post(handlers::toggle_status))
    .route("/api/accounts/{id}/descendants", get(handlers::descendants))
    .route(
      "/api/accounts/{id}/game-configs",
      post(handlers::assign_game_config),
    )
    .route("/api/roles/{role}/count", get(handlers::role_count))
    .route("/api/transfer", post(handlers::transfer))
    .route("/api/adjust", post(handlers::adjust))
    .route("/health", get(handlers::health))
    .layer(
      ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(GovernorLayer::new(governor_conf))
        .layer(
          CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        ),
    )
    .with_state(app_state);

  let port: u16 =
    env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
  let addr = SocketAddr::from(([0, 0, 0, 0], port));

  info!("HTTP server listening on {}", addr);

  let listener =
    tokio::net::TcpListener::bind(addr).await.expect("Failed to bind");
  axum::serve(listener, app).await.expect("Server error");
}
