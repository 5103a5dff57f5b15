//! WebSocket chat flows end to end.

use std::time::Duration;

use serde_json::json;
use tokio_tungstenite::tungstenite;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_two_users_chat_in_channel() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    assert_eq!(alice.recv_tag("user.connected").await["username"], "alice");
    assert_eq!(bob.recv_tag("user.connected").await["username"], "bob");

    alice.send("channel.join", json!({ "channel": "general" })).await;
    assert_eq!(alice.recv_tag("user.join").await["channel"], "general");
    let info = alice.recv_tag("channel.info").await;
    assert_eq!(info["users"], json!(["alice"]));

    bob.send("channel.join", json!({ "channel": "general" })).await;
    let info = bob.recv_tag("channel.info").await;
    let mut users: Vec<String> = serde_json::from_value(info["users"].clone()).expect("users");
    users.sort();
    assert_eq!(users, vec!["alice", "bob"]);
    assert_eq!(alice.recv_tag("channel.joined").await["username"], "bob");

    alice
        .send(
            "channel.chat",
            json!({ "channel": "general", "message": "hi", "sender": "bob" }),
        )
        .await;
    for client in [&mut alice, &mut bob] {
        let chat = client.recv_tag("channel.chat").await;
        assert_eq!(chat["sender"], "alice");
        assert_eq!(chat["channel"], "general");
        assert_eq!(chat["message"], "hi");
    }

    app.shutdown().await;
}

#[tokio::test]
async fn test_channel_list_includes_defaults() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;

    alice.send_raw("channels.list\n{}").await;
    let reply = alice.recv_tag("channels.list.reply").await;
    let mut channels: Vec<String> =
        serde_json::from_value(reply["channels"].clone()).expect("channels");
    channels.sort();
    assert_eq!(channels, vec!["General", "Random"]);

    app.shutdown().await;
}

#[tokio::test]
async fn test_upgrade_requires_valid_token() {
    let app = TestApp::spawn().await;

    for path in ["/ws", "/ws?token=not-a-jwt"] {
        match app.try_connect(path).await {
            Err(tungstenite::Error::Http(response)) => assert_eq!(response.status(), 401),
            Err(other) => panic!("expected HTTP 401, got {other}"),
            Ok(_) => panic!("upgrade to {path} should be refused"),
        }
    }

    app.shutdown().await;
}

#[tokio::test]
async fn test_query_token_fallback() {
    let app = TestApp::spawn().await;
    let token = app.token("carol");

    let mut carol = app
        .try_connect(&format!("/ws?token={token}"))
        .await
        .expect("upgrade with query token");
    assert_eq!(carol.recv_tag("user.connected").await["username"], "carol");

    app.shutdown().await;
}

#[tokio::test]
async fn test_disconnect_announces_departure() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;
    let mut bob = app.connect("bob").await;

    alice.send("channel.join", json!({ "channel": "General" })).await;
    alice.recv_tag("channel.info").await;
    bob.send("channel.join", json!({ "channel": "General" })).await;
    bob.recv_tag("channel.info").await;

    alice.close().await;

    let left = bob.recv_tag("channel.left").await;
    assert_eq!(left["username"], "alice");
    assert_eq!(left["channel"], "General");

    app.shutdown().await;
}

#[tokio::test]
async fn test_malformed_frames_do_not_close_connection() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;

    alice.send_raw("no delimiter here").await;
    alice.send_raw("bogus.tag\n{}").await;
    alice.send_raw("channel.join\n{broken").await;

    alice.send_raw("channels.list\n{}").await;
    alice.recv_tag("channels.list.reply").await;
    assert!(app.state.realtime.metrics.snapshot().decode_failures >= 3);

    app.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_closes_open_connections() {
    let app = TestApp::spawn().await;
    let mut alice = app.connect("alice").await;
    alice.recv_tag("user.connected").await;

    let state = app.state.clone();
    app.shutdown().await;

    alice.closed().await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(state.realtime.connections.connection_count(), 0);
}
