use axum::{routing::get, Router};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::api::routes::{
    add_deck, delete_deck, get_all_decks, get_cards_in_deck, get_deck, update_deck, AppState,
};

/// Mount point of the deck resource.
pub const DECK_BASE: &str = "/api/deck";

pub fn build_router(state: Arc<AppState>) -> Router {
    let decks = Router::new()
        .route("/", get(get_all_decks).post(add_deck))
        .route(
            "/:deck_id",
            get(get_deck).put(update_deck).delete(delete_deck),
        )
        .route("/cardlist/:deck_id", get(get_cards_in_deck));

    Router::new()
        .nest(DECK_BASE, decks)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn run(state: Arc<AppState>, addr: SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!("deck API listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
