//! Scenario tests against an in-process WebSocket server playing the TV.

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message, WebSocketStream};
use webostv::{ClientConfig, PairingStatus, WebOsError, WebOsTv};

type Ws = WebSocketStream<TcpStream>;

async fn recv_json(ws: &mut Ws) -> Value {
    loop {
        match ws
            .next()
            .await
            .expect("connection ended unexpectedly")
            .expect("websocket error")
        {
            Message::Text(text) => return serde_json::from_str(&text).unwrap(),
            Message::Close(_) => panic!("peer closed while a frame was expected"),
            _ => {}
        }
    }
}

async fn send_json(ws: &mut Ws, value: Value) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

/// Accept one connection and run `script` as the TV side.
async fn spawn_tv<F, Fut>(script: F) -> (SocketAddr, JoinHandle<()>)
where
    F: FnOnce(Ws) -> Fut + Send + 'static,
    Fut: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let ws = accept_async(stream).await.unwrap();
        script(ws).await;
    });
    (addr, handle)
}

/// TV side of the stored-key fast path: registered without a prompt.
async fn accept_registration(ws: &mut Ws) -> Value {
    let register = recv_json(ws).await;
    assert_eq!(register["type"], "register");
    send_json(
        ws,
        json!({
            "id": register["id"],
            "type": "registered",
            "payload": {"client-key": "test-client-key"}
        }),
    )
    .await;
    register
}

fn config_for(addr: SocketAddr) -> ClientConfig {
    ClientConfig::new(addr.ip().to_string()).port(addr.port())
}

#[tokio::test]
async fn pairing_yields_prompted_then_registered() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        let register = recv_json(&mut ws).await;
        assert_eq!(register["type"], "register");
        assert!(register.get("uri").is_none());
        assert_eq!(register["payload"]["pairingType"], "PROMPT");
        assert_eq!(register["payload"]["manifest"]["signed"]["appId"], "com.lge.test");
        assert!(register["payload"].get("client-key").is_none());

        let id = register["id"].clone();
        send_json(
            &mut ws,
            json!({"id": id, "type": "response", "payload": {"pairingType": "PROMPT"}}),
        )
        .await;
        send_json(
            &mut ws,
            json!({"id": id, "type": "registered", "payload": {"client-key": "fresh-key"}}),
        )
        .await;

        // First command right after pairing
        let request = recv_json(&mut ws).await;
        assert_eq!(request["type"], "request");
        assert_eq!(request["uri"], "ssap://audio/setVolume");
        assert_eq!(request["payload"], json!({"volume": 42}));
        send_json(
            &mut ws,
            json!({"id": request["id"], "type": "response", "payload": {"returnValue": true}}),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr)).await.unwrap();
    let mut pairing = tv.register().await.unwrap();

    assert_eq!(
        pairing.next().await.unwrap().unwrap(),
        PairingStatus::Prompted
    );
    match pairing.next().await.unwrap().unwrap() {
        PairingStatus::Registered { client_key } => assert_eq!(client_key, "fresh-key"),
        other => panic!("expected Registered, got {other:?}"),
    }
    assert!(pairing.next().await.is_none());

    tv.media().set_volume(42).await.unwrap();
    tv.close().await;
    server.await.unwrap();
}

#[tokio::test]
async fn stored_client_key_skips_the_prompt() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        let register = recv_json(&mut ws).await;
        assert_eq!(register["payload"]["client-key"], "stored-key");
        send_json(
            &mut ws,
            json!({
                "id": register["id"],
                "type": "registered",
                "payload": {"client-key": "stored-key"}
            }),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("stored-key"))
        .await
        .unwrap();
    let key = tv.pair().await.unwrap();
    assert_eq!(key, "stored-key");
    tv.close().await;
    server.await.unwrap();
}

#[tokio::test]
async fn commands_are_gated_until_registered() {
    let (addr, _server) = spawn_tv(|mut ws| async move {
        // Never answer anything
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr)).await.unwrap();
    let err = tv.media().get_volume().await.unwrap_err();
    assert!(matches!(err, WebOsError::NotRegistered));
    tv.close().await;
}

#[tokio::test]
async fn registration_rejection_fails_the_pairing() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        let register = recv_json(&mut ws).await;
        send_json(
            &mut ws,
            json!({"id": register["id"], "type": "error", "error": "403 user denied pairing"}),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr)).await.unwrap();
    let mut pairing = tv.register().await.unwrap();
    match pairing.next().await.unwrap() {
        Err(WebOsError::RegistrationFailed(reason)) => {
            assert!(reason.contains("denied"), "reason was: {reason}")
        }
        other => panic!("expected RegistrationFailed, got {other:?}"),
    }
    assert!(pairing.next().await.is_none());
    tv.close().await;
    server.await.unwrap();
}

#[tokio::test]
async fn subscription_delivers_events_in_order() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;

        // The subscribe envelope carries a fresh UUID id and the flag payload
        let subscribe = recv_json(&mut ws).await;
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(subscribe["uri"], "ssap://audio/getVolume");
        assert_eq!(subscribe["payload"], json!({"subscribe": true}));
        let id = subscribe["id"].clone();
        assert_eq!(id.as_str().unwrap().len(), 36);

        for (volume, muted) in [(10, false), (15, false), (15, true)] {
            send_json(
                &mut ws,
                json!({
                    "id": id,
                    "type": "response",
                    "payload": {"volume": volume, "muted": muted, "returnValue": true}
                }),
            )
            .await;
        }

        let unsubscribe = recv_json(&mut ws).await;
        assert_eq!(unsubscribe["type"], "unsubscribe");
        assert_eq!(unsubscribe["id"], id);
        assert_eq!(unsubscribe["uri"], "ssap://audio/getVolume");
        assert_eq!(unsubscribe["payload"], json!({}));
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    tv.media()
        .subscribe_get_volume(move |event| {
            let events_tx = events_tx.clone();
            async move {
                let payload = event.unwrap().into_payload().unwrap();
                let _ = events_tx.send(payload);
            }
        })
        .await
        .unwrap();

    let first = events_rx.recv().await.unwrap();
    assert_eq!(first["volume"], 10);
    assert_eq!(first["muted"], false);
    let second = events_rx.recv().await.unwrap();
    assert_eq!(second["volume"], 15);
    assert_eq!(second["muted"], false);
    let third = events_rx.recv().await.unwrap();
    assert_eq!(third["volume"], 15);
    assert_eq!(third["muted"], true);

    tv.media().unsubscribe_get_volume().await.unwrap();
    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn duplicate_subscribe_fails_without_sending_a_frame() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;

        let subscribe = recv_json(&mut ws).await;
        assert_eq!(subscribe["type"], "subscribe");

        // The frame after the first subscribe must be the sentinel request,
        // proving the duplicate subscribe wrote nothing
        let next = recv_json(&mut ws).await;
        assert_eq!(next["type"], "request");
        assert_eq!(next["uri"], "ssap://audio/getVolume");
        send_json(
            &mut ws,
            json!({
                "id": next["id"],
                "type": "response",
                "payload": {"volume": 7, "muted": false, "returnValue": true}
            }),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    tv.media()
        .subscribe_get_volume(|_| async {})
        .await
        .unwrap();
    let err = tv
        .media()
        .subscribe_get_volume(|_| async {})
        .await
        .unwrap_err();
    assert!(matches!(err, WebOsError::AlreadySubscribed(_)));

    let volume = tv.media().get_volume().await.unwrap();
    assert_eq!(volume["volume"], 7);
    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn unsubscribe_without_subscription_fails_locally() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;

        // The frame after pairing must be the sentinel request; the bad
        // unsubscribe wrote nothing
        let next = recv_json(&mut ws).await;
        assert_eq!(next["type"], "request");
        assert_eq!(next["uri"], "ssap://system/getSystemInfo");
        send_json(
            &mut ws,
            json!({"id": next["id"], "type": "response", "payload": {"returnValue": true}}),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    let err = tv.media().unsubscribe_get_volume().await.unwrap_err();
    assert!(matches!(err, WebOsError::NotSubscribed(_)));

    tv.system().info().await.unwrap();
    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn out_of_range_volume_never_touches_the_wire() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;

        // The rejected set_volume must not reach the TV
        let next = recv_json(&mut ws).await;
        assert_eq!(next["uri"], "ssap://system/getSystemInfo");
        send_json(
            &mut ws,
            json!({"id": next["id"], "type": "response", "payload": {"returnValue": true}}),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    let err = tv.media().set_volume(150).await.unwrap_err();
    assert!(matches!(err, WebOsError::InvalidArgument(_)));

    tv.system().info().await.unwrap();
    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn connection_loss_fails_pending_and_notifies_subscriptions_once() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;
        let subscribe = recv_json(&mut ws).await;
        assert_eq!(subscribe["type"], "subscribe");
        let request = recv_json(&mut ws).await;
        assert_eq!(request["uri"], "ssap://system/getSystemInfo");
        // Drop mid-flight without answering
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    tv.media()
        .subscribe_get_volume(move |event| {
            let events_tx = events_tx.clone();
            async move {
                let _ = events_tx.send(event.is_ok());
            }
        })
        .await
        .unwrap();

    let err = tv.system().info().await.unwrap_err();
    assert!(matches!(err, WebOsError::ConnectionClosed));

    // The callback sees the disconnect exactly once
    assert_eq!(events_rx.recv().await, Some(false));
    assert!(timeout(Duration::from_millis(200), events_rx.recv())
        .await
        .is_err());

    // Both registries are empty afterwards
    let err = tv.media().unsubscribe_get_volume().await.unwrap_err();
    assert!(matches!(err, WebOsError::NotSubscribed(_)));

    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn request_ids_are_unique_within_a_connection() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        let register = recv_json(&mut ws).await;
        let register_id = register["id"].as_str().unwrap().to_string();
        send_json(
            &mut ws,
            json!({
                "id": register["id"],
                "type": "registered",
                "payload": {"client-key": "k"}
            }),
        )
        .await;

        let mut seen = vec![register_id];
        for _ in 0..2 {
            let request = recv_json(&mut ws).await;
            let id = request["id"].as_str().unwrap().to_string();
            assert!(!seen.contains(&id), "request id {id} was reused");
            seen.push(id);
            send_json(
                &mut ws,
                json!({"id": request["id"], "type": "response", "payload": {"returnValue": true}}),
            )
            .await;
        }
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();
    tv.system().info().await.unwrap();
    tv.system().info().await.unwrap();
    server.await.unwrap();
    tv.close().await;
}

#[tokio::test]
async fn unanswered_request_times_out() {
    let (addr, _server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;
        let _request = recv_json(&mut ws).await;
        // Sit on the request until the client gives up
        while let Some(Ok(msg)) = ws.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    })
    .await;

    let config = config_for(addr)
        .client_key("k")
        .request_timeout(Duration::from_millis(200));
    let tv = WebOsTv::connect(config).await.unwrap();
    tv.pair().await.unwrap();

    let err = tv.system().info().await.unwrap_err();
    assert!(matches!(err, WebOsError::Timeout));
    tv.close().await;
}

#[tokio::test]
async fn tv_error_reply_surfaces_command_failure() {
    let (addr, server) = spawn_tv(|mut ws| async move {
        accept_registration(&mut ws).await;
        let request = recv_json(&mut ws).await;
        send_json(
            &mut ws,
            json!({"id": request["id"], "type": "error", "error": "500 internal error"}),
        )
        .await;

        // returnValue=false path on the following request
        let request = recv_json(&mut ws).await;
        send_json(
            &mut ws,
            json!({
                "id": request["id"],
                "type": "response",
                "payload": {"returnValue": false, "errorCode": 501, "errorText": "not allowed"}
            }),
        )
        .await;
    })
    .await;

    let tv = WebOsTv::connect(config_for(addr).client_key("k")).await.unwrap();
    tv.pair().await.unwrap();

    match tv.system().info().await.unwrap_err() {
        WebOsError::CommandFailed { message, .. } => assert!(message.contains("500")),
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    match tv.system().info().await.unwrap_err() {
        WebOsError::CommandFailed { code, message } => {
            assert_eq!(code, Some(501));
            assert_eq!(message, "not allowed");
        }
        other => panic!("expected CommandFailed, got {other:?}"),
    }
    server.await.unwrap();
    tv.close().await;
}
