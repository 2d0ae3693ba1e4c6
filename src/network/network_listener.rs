//! # Network Listener Module
//!
//! This module accepts WebSocket connections and hands each one to its own
//! [`SessionController`].
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐    ┌──────────────────┐    ┌───────────────────┐
//! │ Incoming        │───▶│ NetworkListener  │───▶│ SessionController │
//! │ WebSockets      │    │ (warp, any path) │    │ (one per client)  │
//! └─────────────────┘    │ - Upgrade        │    └───────────────────┘
//!                        │ - Ping/pong drop │
//!                        │ - Close → end    │
//!                        └──────────────────┘
//! ```
//!
//! Sessions never talk to each other; the listener only shares the
//! [`SessionContext`] (configuration, factories, reporter, worker permits).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use linewatch::network::network_listener::NetworkListener;
//! use linewatch::session_management::SessionContext;
//!
//! async fn serve(ctx: SessionContext) {
//!     let listener = NetworkListener::bind("0.0.0.0:8009".parse().unwrap())
//!         .await
//!         .unwrap();
//!     listener.run(ctx).await;
//! }
//! ```

use std::net::SocketAddr;

use futures::future;
use futures::{SinkExt, Stream, StreamExt};
use log::{debug, info};
use tokio::net::TcpListener;
use warp::ws::{Message, WebSocket, Ws};
use warp::Filter;

use crate::error_handling::types::{NetworkError, TransportError};
use crate::session_management::{SessionContext, SessionController};

/// WebSocket listener bound to one address.
///
/// Binding happens in [`NetworkListener::bind`] so that an unusable address is
/// reported before anything is served.
pub struct NetworkListener {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl NetworkListener {
    pub async fn bind(addr: SocketAddr) -> Result<Self, NetworkError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(NetworkError::BindError)?;
        let local_addr = listener.local_addr().map_err(NetworkError::BindError)?;
        info!("Listening for WebSocket clients on {}", local_addr);

        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves connections until the process stops.
    pub async fn run(self, ctx: SessionContext) {
        let routes = warp::ws()
            .and(warp::addr::remote())
            .map(move |ws: Ws, peer: Option<SocketAddr>| {
                let ctx = ctx.clone();
                ws.on_upgrade(move |socket| serve_session(ctx, socket, peer))
            });

        warp::serve(routes).incoming(self.listener).run().await;
    }
}

async fn serve_session(ctx: SessionContext, socket: WebSocket, peer: Option<SocketAddr>) {
    let (mut outbound, inbound) = socket.split();

    let report = SessionController::new(ctx, peer)
        .run(inbound_messages(inbound))
        .await;
    debug!(
        "Connection from {:?} finished with {} log entries",
        peer, report.log_entries
    );

    // the client may already be gone
    let _ = outbound.close().await;
}

/// Payloads of data frames, up to the first close frame.
fn inbound_messages<S>(socket: S) -> impl Stream<Item = Result<Vec<u8>, TransportError>> + Send + Unpin
where
    S: Stream<Item = Result<Message, warp::Error>> + Send + Unpin,
{
    socket
        .take_while(|message| future::ready(!matches!(message, Ok(m) if m.is_close())))
        .filter_map(|message| {
            future::ready(match message {
                Ok(m) if m.is_ping() || m.is_pong() => None,
                Ok(m) => Some(Ok(m.as_bytes().to_vec())),
                Err(e) => Some(Err(TransportError::ReceiveFailed(e.to_string()))),
            })
        })
}
