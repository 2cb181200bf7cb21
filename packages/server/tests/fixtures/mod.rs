//! Test fixtures: an in-process relay server and a WebSocket test client.

#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use futures_util::{SinkExt, StreamExt};
use messenger_server::{
    ServerConfig,
    ui::{WEBSOCKET_PATH, serve, state::AppState},
};
use serde_json::{Value, json};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::oneshot,
    time::{sleep, timeout},
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message, client::IntoClientRequest, http::HeaderValue},
};

/// How long to wait for an expected frame
const RECV_TIMEOUT: Duration = Duration::from_secs(2);

/// How long to wait before concluding that no frame is coming
const SILENCE_TIMEOUT: Duration = Duration::from_millis(200);

/// Poll interval while waiting on server-side state
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Relay server running on an ephemeral port; stopped on drop
pub struct TestServer {
    addr: SocketAddr,
    state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    /// Start a server with the default configuration
    pub async fn start() -> Self {
        Self::start_with(|config| config).await
    }

    /// Start a server, adjusting the configuration first
    pub async fn start_with(configure: impl FnOnce(ServerConfig) -> ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local addr");
        let config = configure(ServerConfig::new(addr));
        let state = Arc::new(AppState::new(&config));

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let served = state.clone();
        tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = serve(listener, served, shutdown).await {
                panic!("Test server failed: {}", e);
            }
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
        }
    }

    /// Wait until exactly `expected` connections are registered
    pub async fn wait_for_connections(&self, expected: usize) {
        let manager = &self.state.manager;
        let waited = timeout(RECV_TIMEOUT, async {
            while manager.connection_count().await != expected {
                sleep(POLL_INTERVAL).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "Expected {expected} connection(s), found {}",
            manager.connection_count().await
        );
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}{}", self.addr, WEBSOCKET_PATH)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// WebSocket client speaking the relay protocol
pub struct TestClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    pub async fn connect(server: &TestServer) -> Self {
        let (stream, _) = connect_async(server.ws_url())
            .await
            .expect("Failed to connect");
        Self { stream }
    }

    /// Connect with an `Origin` header
    pub async fn connect_with_origin(
        server: &TestServer,
        origin: &str,
    ) -> Result<Self, tungstenite::Error> {
        let mut request = server
            .ws_url()
            .into_client_request()
            .expect("Failed to build request");
        request.headers_mut().insert(
            "Origin",
            HeaderValue::from_str(origin).expect("Invalid origin"),
        );
        let (stream, _) = connect_async(request).await?;
        Ok(Self { stream })
    }

    pub async fn send_raw(&mut self, frame: &str) {
        self.stream
            .send(Message::text(frame.to_string()))
            .await
            .expect("Failed to send frame");
    }

    pub async fn add_user(&mut self, user_id: &str) {
        let frame = json!({"event": "addUser", "data": user_id}).to_string();
        self.send_raw(&frame).await;
    }

    pub async fn send_message(&mut self, sender_id: &str, receiver_id: &str, text: &str) {
        let frame = json!({
            "event": "sendMessage",
            "data": {"senderId": sender_id, "receiverId": receiver_id, "text": text},
        })
        .to_string();
        self.send_raw(&frame).await;
    }

    /// Next JSON event; panics on timeout or close
    pub async fn recv_event(&mut self) -> Value {
        loop {
            let msg = timeout(RECV_TIMEOUT, self.stream.next())
                .await
                .expect("Timed out waiting for event")
                .expect("Connection closed")
                .expect("WebSocket error");
            if let Message::Text(text) = msg {
                return serde_json::from_str(text.as_str()).expect("Server sent invalid JSON");
            }
        }
    }

    /// Next `getUsers` payload
    pub async fn recv_roster(&mut self) -> Vec<String> {
        let event = self.recv_event().await;
        assert_eq!(event["event"], "getUsers", "unexpected event: {event}");
        serde_json::from_value(event["data"].clone()).expect("Roster is not a string list")
    }

    /// Skip roster updates until one equals `expected`
    pub async fn wait_for_roster(&mut self, expected: &[&str]) {
        loop {
            if self.recv_roster().await == expected {
                return;
            }
        }
    }

    /// Skip roster updates until a `getMessage` arrives
    pub async fn wait_for_message(&mut self) -> Value {
        loop {
            let event = self.recv_event().await;
            if event["event"] == "getMessage" {
                return event;
            }
        }
    }

    /// Assert that nothing arrives for a short while
    pub async fn expect_silence(&mut self) {
        if let Ok(Some(Ok(Message::Text(text)))) =
            timeout(SILENCE_TIMEOUT, self.stream.next()).await
        {
            panic!("Expected no event, got {}", text.as_str());
        }
    }

    /// Assert that the server ends the connection
    pub async fn expect_closed(&mut self) {
        loop {
            match timeout(RECV_TIMEOUT, self.stream.next()).await {
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return,
                Ok(Some(Ok(_))) => continue,
                Err(_) => panic!("Connection is still open"),
            }
        }
    }

    /// Close with a close handshake
    pub async fn close(mut self) {
        let _ = self.stream.close(None).await;
    }

    /// Drop the socket without a close handshake
    pub fn abort(self) {
        drop(self.stream);
    }
}
