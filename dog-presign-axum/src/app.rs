use axum::extract::DefaultBodyLimit;
use axum::Router;
use dog_presign::TransferOrchestrator;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::PresignState;

pub const DEFAULT_MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct PresignApp {
    pub state: PresignState,
    pub router: Router<()>,
}

impl PresignApp {
    pub fn new(transfers: TransferOrchestrator) -> Self {
        Self::with_body_limit(transfers, DEFAULT_MAX_BODY_BYTES)
    }

    /// Routes behind request-id, tracing and body-limit layers
    pub fn with_body_limit(transfers: TransferOrchestrator, max_body_bytes: usize) -> Self {
        let state = PresignState::new(transfers);
        let router = routes::router(state.clone())
            .layer(DefaultBodyLimit::max(max_body_bytes))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id()),
            );
        Self { state, router }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn presign(transfers: TransferOrchestrator) -> PresignApp {
    PresignApp::new(transfers)
}
