//! Shared test helpers for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::Router;
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use chathub_api::{AppState, build_router};
use chathub_auth::JwtEncoder;
use chathub_core::config::AppConfig;

/// Test application: a server on `127.0.0.1:0` sharing state with the test.
pub struct TestApp {
    /// Bound address
    pub addr: SocketAddr,
    /// Shared application state
    pub state: AppState,
    shutdown: Option<oneshot::Sender<()>>,
    server: JoinHandle<()>,
}

impl TestApp {
    /// Start a server with default configuration.
    pub async fn spawn() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-test-secret".to_string();
        config.server.shutdown_grace_seconds = 2;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let state = AppState::new(config);

        let (shutdown, signal) = oneshot::channel::<()>();
        let server_state = state.clone();
        let server = tokio::spawn(async move {
            chathub_api::serve(listener, server_state, async {
                let _ = signal.await;
            })
            .await
            .expect("server");
        });

        Self {
            addr,
            state,
            shutdown: Some(shutdown),
            server,
        }
    }

    /// Router over the same state, for in-process HTTP requests.
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// A valid token for `username`.
    pub fn token(&self, username: &str) -> String {
        JwtEncoder::new(&self.state.config.auth)
            .issue(username)
            .expect("issue token")
    }

    /// Connect with the token offered as the WebSocket subprotocol.
    pub async fn connect(&self, username: &str) -> TestClient {
        let mut request = format!("ws://{}/ws", self.addr)
            .into_client_request()
            .expect("request");
        let token = self.token(username);
        request.headers_mut().insert(
            "Sec-WebSocket-Protocol",
            HeaderValue::from_str(&token).expect("header"),
        );

        let (ws, response) = tokio_tungstenite::connect_async(request)
            .await
            .expect("handshake");
        assert_eq!(
            response
                .headers()
                .get("Sec-WebSocket-Protocol")
                .and_then(|v| v.to_str().ok()),
            Some(token.as_str())
        );
        TestClient { ws }
    }

    /// Connect with an arbitrary URL path and query, returning the raw result.
    pub async fn try_connect(
        &self,
        path_and_query: &str,
    ) -> Result<TestClient, tungstenite::Error> {
        let url = format!("ws://{}{}", self.addr, path_and_query);
        let (ws, _) = tokio_tungstenite::connect_async(url).await?;
        Ok(TestClient { ws })
    }

    /// Trigger graceful shutdown and wait for the server to finish.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        tokio::time::timeout(Duration::from_secs(10), &mut self.server)
            .await
            .expect("server stops")
            .expect("server task");
    }
}

/// A WebSocket client speaking the `TAG\nJSON` envelope format.
pub struct TestClient {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Send one envelope.
    pub async fn send(&mut self, tag: &str, payload: Value) {
        self.send_raw(&format!("{tag}\n{payload}")).await;
    }

    /// Send a raw text frame.
    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::text(text.to_string()))
            .await
            .expect("send");
    }

    /// Next envelope, split into tag and payload.
    pub async fn recv(&mut self) -> (String, Value) {
        loop {
            let message = tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("message within timeout")
                .expect("stream open")
                .expect("message");
            match message {
                Message::Text(text) => {
                    let (tag, payload) = text.as_str().split_once('\n').expect("delimiter");
                    let payload = serde_json::from_str(payload).expect("json payload");
                    return (tag.to_string(), payload);
                }
                Message::Ping(_) | Message::Pong(_) => continue,
                other => panic!("unexpected message: {other:?}"),
            }
        }
    }

    /// Skip envelopes until one with `tag` arrives; returns its payload.
    pub async fn recv_tag(&mut self, tag: &str) -> Value {
        loop {
            let (received, payload) = self.recv().await;
            if received == tag {
                return payload;
            }
        }
    }

    /// Wait until the server closes the connection.
    pub async fn closed(&mut self) {
        loop {
            match tokio::time::timeout(Duration::from_secs(5), self.ws.next())
                .await
                .expect("close within timeout")
            {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => return,
                Some(Ok(_)) => continue,
            }
        }
    }

    /// Close from the client side.
    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}
