//! OCPP-J WebSocket server
//!
//! Accepts charging station connections at
//! `ws://<host>:<port>/<prefix>/{tenant_id}/{token_id}/{charging_station_id}`.
//! Any prefix is accepted; the last three path segments identify the
//! connection.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::{HeaderValue, StatusCode};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use super::negotiator::ProtocolNegotiator;
use super::tenant_cache::TenantCache;
use crate::application::charging::session::{
    ConnectionSession, SessionIdentity, SessionServices, SharedSessionRegistry,
};
use crate::config::ServerConfig;
use crate::domain::{OcppVersion, RepositoryProvider, Tenant};
use crate::shared::ocpp_frame::OcppFrame;
use crate::shared::shutdown::ShutdownSignal;

type ServerResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Identity carried by the connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionPath {
    pub tenant_id: String,
    pub token_id: String,
    pub charging_station_id: String,
}

impl ConnectionPath {
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let start = segments.len().checked_sub(3)?;
        let [tenant_id, token_id, charging_station_id] = segments[start..] else {
            return None;
        };
        Some(Self {
            tenant_id: tenant_id.to_string(),
            token_id: token_id.to_string(),
            charging_station_id: charging_station_id.to_string(),
        })
    }
}

/// Outcome of a successful handshake.
struct Handshake {
    path: ConnectionPath,
    tenant: Tenant,
    version: OcppVersion,
}

/// Why a connection's reader loop ended.
enum Ending {
    /// Station closed the socket or the stream failed
    Peer,
    /// Replaced by a newer connection of the same station
    Evicted,
    Shutdown,
}

impl Ending {
    fn close_frame(&self) -> Option<CloseFrame<'static>> {
        match self {
            Self::Peer => None,
            Self::Evicted => Some(CloseFrame {
                code: CloseCode::Policy,
                reason: "replaced by a newer connection".into(),
            }),
            Self::Shutdown => Some(CloseFrame {
                code: CloseCode::Away,
                reason: "server shutting down".into(),
            }),
        }
    }
}

struct ServerContext {
    services: SessionServices,
    tenants: TenantCache,
    registry: SharedSessionRegistry,
    negotiator: ProtocolNegotiator,
    charging_station_url: String,
    shutdown: Option<ShutdownSignal>,
}

/// OCPP WebSocket Server
pub struct OcppServer {
    address: String,
    ctx: Arc<ServerContext>,
}

impl OcppServer {
    pub fn new(
        config: &ServerConfig,
        services: SessionServices,
        repos: Arc<dyn RepositoryProvider>,
        registry: SharedSessionRegistry,
    ) -> Self {
        Self {
            address: config.address(),
            ctx: Arc::new(ServerContext {
                services,
                tenants: TenantCache::new(
                    repos,
                    Duration::from_secs(config.tenant_refresh_secs),
                ),
                registry,
                negotiator: ProtocolNegotiator::from_subprotocols(&config.supported_subprotocols),
                charging_station_url: config.charging_station_url(),
                shutdown: None,
            }),
        }
    }

    /// Set the shutdown signal for graceful shutdown
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        if let Some(ctx) = Arc::get_mut(&mut self.ctx) {
            ctx.shutdown = Some(signal);
        }
        self
    }

    pub fn session_registry(&self) -> &SharedSessionRegistry {
        &self.ctx.registry
    }

    /// Bind the configured address and serve until shutdown.
    pub async fn run(&self) -> ServerResult<()> {
        let listener = TcpListener::bind(&self.address).await?;
        self.serve(listener).await
    }

    /// Serve connections from an already bound listener.
    pub async fn serve(&self, listener: TcpListener) -> ServerResult<()> {
        let addr = listener.local_addr()?;
        info!(
            %addr,
            subprotocols = ?self.ctx.negotiator.supported_subprotocols(),
            "🔌 OCPP gateway started on ws://{}", addr
        );
        info!(
            "   Charging stations should connect to: {}/OCPP16/{{tenant}}/{{token}}/{{station}}",
            self.ctx.charging_station_url
        );

        let Some(shutdown) = self.ctx.shutdown.clone() else {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => self.spawn_connection(stream, addr),
                    Err(e) => error!(error = %e, "Failed to accept connection"),
                }
            }
        };

        let stop = shutdown.notified().wait();
        tokio::pin!(stop);
        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => self.spawn_connection(stream, addr),
                        Err(e) => error!(error = %e, "Failed to accept connection"),
                    }
                }
                _ = &mut stop => {
                    info!("🛑 WebSocket server received shutdown signal");
                    self.graceful_shutdown().await;
                    return Ok(());
                }
            }
        }
    }

    fn spawn_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let ctx = self.ctx.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, ctx).await {
                warn!(%addr, error = %e, "Connection error");
            }
        });
    }

    async fn graceful_shutdown(&self) {
        let sessions = self.ctx.registry.all();
        if !sessions.is_empty() {
            info!(
                count = sessions.len(),
                "📢 Closing connected charging station sessions..."
            );
        }
        for session in sessions {
            self.ctx.registry.unregister(&session);
            if let Err(e) = session.close().await {
                debug!(error = %e, "Session already closing");
            }
        }
        info!("✅ WebSocket server shutdown complete");
    }
}

fn reject(reason: &str) -> ErrorResponse {
    let mut response = ErrorResponse::new(Some(reason.to_string()));
    *response.status_mut() = StatusCode::BAD_REQUEST;
    response
}

/// Validate the upgrade request: path, tenant, subprotocol.
fn check_handshake(
    req: &Request,
    tenants: &HashMap<String, Tenant>,
    negotiator: &ProtocolNegotiator,
) -> Result<Handshake, ErrorResponse> {
    let path = req.uri().path();
    let Some(path) = ConnectionPath::parse(path) else {
        warn!(path, "Handshake refused, unexpected path");
        return Err(reject("expected /{tenant}/{token}/{charging_station_id}"));
    };
    let Some(tenant) = tenants.get(&path.tenant_id).cloned() else {
        warn!(tenant_id = %path.tenant_id, "Handshake refused, unknown tenant");
        return Err(reject("unknown tenant"));
    };

    let requested = req
        .headers()
        .get("Sec-WebSocket-Protocol")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let Some(version) = negotiator.negotiate(requested) else {
        warn!(
            tenant_id = %path.tenant_id,
            charging_station_id = %path.charging_station_id,
            requested,
            "Handshake refused, no supported subprotocol"
        );
        return Err(reject("no supported OCPP subprotocol"));
    };

    Ok(Handshake {
        path,
        tenant,
        version,
    })
}

/// Handle a single WebSocket connection
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    ctx: Arc<ServerContext>,
) -> ServerResult<()> {
    debug!(%addr, "New connection");

    // Tenants are resolved before the upgrade so unknown ones get a 400
    let tenants = ctx.tenants.snapshot().await?;

    let mut handshake: Option<Handshake> = None;
    let ws_stream = tokio_tungstenite::accept_hdr_async(
        stream,
        |req: &Request, mut response: Response| {
            let accepted = check_handshake(req, &tenants, &ctx.negotiator)?;
            response.headers_mut().insert(
                "Sec-WebSocket-Protocol",
                HeaderValue::from_static(accepted.version.subprotocol()),
            );
            handshake = Some(accepted);
            Ok(response)
        },
    )
    .await?;
    let Some(Handshake {
        path,
        tenant,
        version,
    }) = handshake
    else {
        return Err("handshake accepted without identity".into());
    };

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();
    let (outbound, mut rx) = mpsc::unbounded_channel::<String>();

    let identity = SessionIdentity::json(
        tenant,
        path.charging_station_id.clone(),
        version,
        ctx.charging_station_url.clone(),
    )
    .with_token(Some(path.token_id))
    .with_client_address(Some(addr.ip().to_string()));
    let session = Arc::new(ConnectionSession::new(
        identity,
        ctx.services.clone(),
        outbound.clone(),
    ));
    session.initialize()?;
    if let Some(previous) = ctx.registry.register(session.clone()) {
        if let Err(e) = previous.close().await {
            debug!(error = %e, "Evicted session already closing");
        }
    }

    let tenant_id = path.tenant_id;
    let station_id = path.charging_station_id;

    // Outgoing frames. On stop, queued frames are flushed before the close
    let (stop_tx, mut stop_rx) = oneshot::channel::<Option<CloseFrame<'static>>>();
    let mut send_task = {
        let station_id = station_id.clone();
        tokio::spawn(async move {
            let close = loop {
                tokio::select! {
                    msg = rx.recv() => {
                        let Some(msg) = msg else { return };
                        debug!(charging_station_id = %station_id, "-> {}", msg);
                        if let Err(e) = ws_sender.send(Message::Text(msg)).await {
                            warn!(charging_station_id = %station_id, error = %e, "Send error");
                            return;
                        }
                    }
                    close = &mut stop_rx => break close.ok().flatten(),
                }
            };
            while let Ok(msg) = rx.try_recv() {
                if ws_sender.send(Message::Text(msg)).await.is_err() {
                    return;
                }
            }
            if close.is_some() {
                if let Err(e) = ws_sender.send(Message::Close(close)).await {
                    debug!(charging_station_id = %station_id, error = %e, "Close frame not sent");
                }
            }
            let _ = ws_sender.close().await;
        })
    };

    // Incoming frames, strictly in arrival order
    let reader = async {
        while let Some(msg) = ws_receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if !handle_text(&session, &outbound, &text).await {
                        break;
                    }
                }
                Ok(Message::Ping(data)) => session.on_ping(&data),
                Ok(Message::Pong(data)) => session.on_pong(&data),
                Ok(Message::Close(frame)) => {
                    info!(
                        tenant_id = %tenant_id,
                        charging_station_id = %station_id,
                        ?frame,
                        "Close frame received"
                    );
                    break;
                }
                Ok(Message::Binary(data)) => {
                    warn!(
                        charging_station_id = %station_id,
                        bytes = data.len(),
                        "Binary message received, ignoring"
                    );
                }
                Ok(Message::Frame(_)) => {}
                Err(e) => {
                    warn!(charging_station_id = %station_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    };

    let shutdown = async {
        match &ctx.shutdown {
            Some(shutdown) => shutdown.notified().wait().await,
            None => std::future::pending::<()>().await,
        }
    };
    let ending = tokio::select! {
        biased;
        _ = shutdown => {
            info!(charging_station_id = %station_id, "Connection closing due to server shutdown");
            Ending::Shutdown
        }
        _ = session.closed() => {
            info!(
                tenant_id = %tenant_id,
                charging_station_id = %station_id,
                "Session closed elsewhere, dropping connection"
            );
            Ending::Evicted
        }
        _ = reader => Ending::Peer,
    };

    // Cleanup
    ctx.registry.unregister(&session);
    if let Err(e) = session.close().await {
        debug!(charging_station_id = %station_id, error = %e, "Session already closing");
    }
    let _ = stop_tx.send(ending.close_frame());
    if tokio::time::timeout(Duration::from_secs(2), &mut send_task)
        .await
        .is_err()
    {
        send_task.abort();
    }

    info!(tenant_id = %tenant_id, charging_station_id = %station_id, "Disconnected");
    Ok(())
}

/// Process one text frame. Returns `false` once the outbound channel is
/// gone.
async fn handle_text(
    session: &ConnectionSession,
    outbound: &mpsc::UnboundedSender<String>,
    text: &str,
) -> bool {
    let station_id = session.identity().charging_station_id.as_str();
    debug!(charging_station_id = station_id, "<- {}", text);

    match OcppFrame::parse(text) {
        Ok(OcppFrame::Call {
            unique_id,
            action,
            payload,
        }) => {
            let (reply, handled) = match session.handle_request(&action, payload).await {
                Ok(result) => (OcppFrame::call_result(unique_id, result), true),
                Err(e) => {
                    let err = e.to_ocpp_error();
                    (
                        OcppFrame::call_error(unique_id, err.code.code(), err.message, err.details),
                        false,
                    )
                }
            };
            if outbound.send(reply.serialize()).is_err() {
                return false;
            }
            if handled {
                if let Err(e) = session.update_runtime_data().await {
                    warn!(
                        charging_station_id = station_id,
                        action = %action,
                        error = %e,
                        "Failed to update runtime data"
                    );
                }
            }
        }
        Ok(OcppFrame::CallResult { unique_id, .. }) => {
            debug!(charging_station_id = station_id, unique_id = %unique_id, "CallResult received");
        }
        Ok(OcppFrame::CallError {
            unique_id,
            error_code,
            error_description,
            ..
        }) => {
            warn!(
                charging_station_id = station_id,
                unique_id = %unique_id,
                error_code = %error_code,
                error_description = %error_description,
                "CallError received"
            );
        }
        Err(e) => {
            warn!(charging_station_id = station_id, error = %e, "Malformed OCPP frame, ignoring");
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::{json, Value};
    use tokio_tungstenite::tungstenite::client::IntoClientRequest;
    use tokio_tungstenite::tungstenite::Error as WsError;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    use super::*;
    use crate::application::charging::dispatch::tracer::recording::RecordingTracer;
    use crate::application::charging::dispatch::{CommandDispatcher, HandlerRegistry};
    use crate::application::charging::services::ChargingStationService;
    use crate::application::charging::session::{HostAffinity, SessionRegistry};
    use crate::infrastructure::storage::InMemoryRepositoryProvider;

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    struct Harness {
        addr: SocketAddr,
        repos: Arc<InMemoryRepositoryProvider>,
        sessions: SharedSessionRegistry,
        tracer: Arc<RecordingTracer>,
        shutdown: ShutdownSignal,
    }

    async fn start() -> Harness {
        let repos = Arc::new(InMemoryRepositoryProvider::new());
        repos
            .tenants()
            .save(&Tenant::new("t1", "acme", "ACME"))
            .await
            .unwrap();
        let provider: Arc<dyn RepositoryProvider> = repos.clone();

        let stations = Arc::new(ChargingStationService::new(provider.clone()));
        let handlers = Arc::new(HandlerRegistry::v16_defaults(stations.clone()).unwrap());
        let tracer = Arc::new(RecordingTracer::default());
        let dispatcher = Arc::new(CommandDispatcher::new(handlers, tracer.clone()));
        let services = SessionServices {
            dispatcher,
            stations,
            host: HostAffinity {
                ip: Some("10.0.0.1".into()),
                name: Some("gw-test".into()),
            },
            monitoring: false,
        };

        let sessions = SessionRegistry::shared();
        let shutdown = ShutdownSignal::new();
        let server = OcppServer::new(&ServerConfig::default(), services, provider, sessions.clone())
            .with_shutdown(shutdown.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { server.serve(listener).await });

        Harness {
            addr,
            repos,
            sessions,
            tracer,
            shutdown,
        }
    }

    async fn connect(addr: SocketAddr, path: &str, protocol: &str) -> Result<Client, WsError> {
        let mut request = format!("ws://{addr}{path}").into_client_request().unwrap();
        request
            .headers_mut()
            .insert("Sec-WebSocket-Protocol", HeaderValue::from_str(protocol).unwrap());
        connect_async(request).await.map(|(ws, _)| ws)
    }

    async fn call(ws: &mut Client, id: &str, action: &str, payload: Value) -> OcppFrame {
        let frame = OcppFrame::call(id, action, payload).serialize();
        ws.send(Message::Text(frame)).await.unwrap();
        loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
                .await
                .expect("reply in time")
                .expect("stream open")
                .unwrap();
            if let Message::Text(text) = msg {
                return OcppFrame::parse(&text).unwrap();
            }
        }
    }

    fn assert_rejected(result: Result<Client, WsError>) {
        match result {
            Err(WsError::Http(response)) => assert_eq!(response.status(), StatusCode::BAD_REQUEST),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("handshake should be refused"),
        }
    }

    #[test]
    fn path_uses_last_three_segments() {
        let path = ConnectionPath::parse("/OCPP16/t1/tok/CS-1").unwrap();
        assert_eq!(path.tenant_id, "t1");
        assert_eq!(path.token_id, "tok");
        assert_eq!(path.charging_station_id, "CS-1");
        assert_eq!(ConnectionPath::parse("/t1/tok/CS-1"), Some(path));
        assert!(ConnectionPath::parse("/t1/CS-1").is_none());
        assert!(ConnectionPath::parse("/").is_none());
    }

    #[tokio::test]
    async fn boot_notification_round_trip() {
        let h = start().await;
        let mut ws = connect(h.addr, "/OCPP16/t1/tok1/CS-1", "ocpp1.6").await.unwrap();

        let reply = call(
            &mut ws,
            "m1",
            "BootNotification",
            json!({"chargePointVendor": "ACME", "chargePointModel": "X1"}),
        )
        .await;
        match reply {
            OcppFrame::CallResult { unique_id, payload } => {
                assert_eq!(unique_id, "m1");
                assert_eq!(payload["status"], "Accepted");
                assert!(payload["interval"].is_number());
            }
            other => panic!("expected CallResult, got {other:?}"),
        }

        // Runtime data of the boot is saved before the next frame is read
        let reply = call(&mut ws, "m2", "Heartbeat", json!({})).await;
        assert!(matches!(reply, OcppFrame::CallResult { .. }));

        assert_eq!(h.tracer.requests(), 2);
        assert_eq!(h.tracer.responses(), 2);
        assert!(h.sessions.is_connected("t1", "CS-1"));

        let cs = h
            .repos
            .charging_stations()
            .find_by_id("t1", "CS-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(cs.vendor.as_deref(), Some("ACME"));
        assert_eq!(cs.ocpp_version.as_deref(), Some("1.6"));
        assert_eq!(cs.token_id.as_deref(), Some("tok1"));
        assert_eq!(cs.cloud_host_name.as_deref(), Some("gw-test"));
    }

    #[tokio::test]
    async fn outbound_command_gets_protocol_error() {
        let h = start().await;
        let mut ws = connect(h.addr, "/OCPP16/t1/tok1/CS-2", "ocpp1.6").await.unwrap();

        let reply = call(&mut ws, "x1", "RemoteStartTransaction", json!({"idTag": "A"})).await;
        match reply {
            OcppFrame::CallError {
                unique_id,
                error_code,
                ..
            } => {
                assert_eq!(unique_id, "x1");
                assert_eq!(error_code, "ProtocolError");
            }
            other => panic!("expected CallError, got {other:?}"),
        }
        assert_eq!(h.tracer.requests(), 0);
    }

    #[tokio::test]
    async fn malformed_payload_gets_formation_violation() {
        let h = start().await;
        let mut ws = connect(h.addr, "/OCPP16/t1/tok1/CS-3", "ocpp1.6").await.unwrap();

        let reply = call(&mut ws, "b1", "BootNotification", json!({"nope": true})).await;
        match reply {
            OcppFrame::CallError { error_code, .. } => assert_eq!(error_code, "FormationViolation"),
            other => panic!("expected CallError, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn handshake_refused_for_unknown_tenant_path_or_protocol() {
        let h = start().await;
        assert_rejected(connect(h.addr, "/OCPP16/nope/tok/CS-1", "ocpp1.6").await);
        assert_rejected(connect(h.addr, "/OCPP16/CS-1", "ocpp1.6").await);
        assert_rejected(connect(h.addr, "/OCPP16/t1/tok/CS-1", "ocpp2.0.1").await);
        assert_eq!(h.sessions.connected_count(), 0);
    }

    #[tokio::test]
    async fn disconnect_unregisters_session() {
        let h = start().await;
        let mut ws = connect(h.addr, "/OCPP16/t1/tok1/CS-4", "ocpp1.6").await.unwrap();
        call(&mut ws, "h1", "Heartbeat", json!({})).await;
        assert!(h.sessions.is_connected("t1", "CS-4"));

        ws.close(None).await.unwrap();
        for _ in 0..50 {
            if !h.sessions.is_connected("t1", "CS-4") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(!h.sessions.is_connected("t1", "CS-4"));
    }

    #[tokio::test]
    async fn reconnect_closes_previous_socket() {
        let h = start().await;
        let mut first = connect(h.addr, "/OCPP16/t1/tok1/CS-9", "ocpp1.6").await.unwrap();
        call(&mut first, "h1", "Heartbeat", json!({})).await;
        let old = h.sessions.get("t1", "CS-9").unwrap();

        let mut second = connect(h.addr, "/OCPP16/t1/tok1/CS-9", "ocpp1.6").await.unwrap();

        // The first socket gets a policy close instead of staying half alive
        let close = loop {
            let msg = tokio::time::timeout(Duration::from_secs(5), first.next())
                .await
                .expect("close in time");
            match msg {
                Some(Ok(Message::Close(frame))) => break frame,
                Some(Ok(_)) => continue,
                other => panic!("expected close frame, got {other:?}"),
            }
        };
        assert_eq!(close.map(|f| f.code), Some(CloseCode::Policy));
        assert_eq!(
            old.state(),
            crate::application::charging::session::SessionState::Closed
        );

        let reply = call(&mut second, "h2", "Heartbeat", json!({})).await;
        assert!(matches!(reply, OcppFrame::CallResult { .. }));
        let current = h.sessions.get("t1", "CS-9").unwrap();
        assert!(!Arc::ptr_eq(&old, &current));
        assert_eq!(h.sessions.connected_count(), 1);
    }

    #[tokio::test]
    async fn shutdown_closes_sessions() {
        let h = start().await;
        let mut ws = connect(h.addr, "/OCPP16/t1/tok1/CS-5", "ocpp1.6").await.unwrap();
        call(&mut ws, "h1", "Heartbeat", json!({})).await;
        let session = h.sessions.get("t1", "CS-5").unwrap();

        h.shutdown.trigger();
        for _ in 0..50 {
            if session.state() == crate::application::charging::session::SessionState::Closed {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert_eq!(
            session.state(),
            crate::application::charging::session::SessionState::Closed
        );
    }
}
