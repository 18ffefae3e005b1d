use std::{
    env,
    net::{Ipv6Addr, SocketAddr},
    sync::Arc,
};

use axum::routing::get;
use log::info;
use tokio::{net::TcpListener, task::spawn_blocking};
use tower_http::cors::{Any, CorsLayer};
use watchparty_collab::Collab;

use crate::{context::ServerContext, sse::ServerSentEvents};

mod context;
mod docs;
mod errors;
mod rooms;
mod schemas;
mod serialized;
mod sse;

pub mod logging;

pub type Router = axum::Router<ServerContext>;

/// The default port the server will listen on.
pub const DEFAULT_PORT: u16 = 9050;

/// Starts the watchparty server
pub async fn run_server(collab: Arc<Collab>) {
    let port = env::var("WATCHPARTY_SERVER_PORT")
        .map(|x| x.parse::<u16>().expect("Port must be a number"))
        .unwrap_or(DEFAULT_PORT);

    let addr: SocketAddr = (Ipv6Addr::UNSPECIFIED, port).into();

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let sse = ServerSentEvents::new();
    let context = ServerContext {
        collab: collab.clone(),
        sse: sse.clone(),
    };

    spawn_blocking(move || loop {
        let event = collab.wait_for_event();
        sse.broadcast(event.into());
    });

    let version_one_router = Router::new()
        .nest("/rooms", rooms::router())
        .nest("/events", sse::router());

    let root_router = Router::new()
        .nest("/v1", version_one_router)
        .route("/api.json", get(docs::docs))
        .layer(cors)
        .with_state(context);

    let listener = TcpListener::bind(&addr).await.expect("listens on address");

    info!("watchparty server listening on port {}", port);

    axum::serve(listener, root_router.into_make_service())
        .await
        .expect("server runs");
}
