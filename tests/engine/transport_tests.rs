//! STOMP Transport Tests
//!
//! Drives a real session over WebSocket against a minimal in-process broker.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::WebSocketStream;

use workspace_chat::application::services::{
    ChatSession, ChatUpdate, ConnectionState, LinkOptions,
};
use workspace_chat::domain::entities::{Connector, LinkEvent};
use workspace_chat::infrastructure::stomp::{Command, Frame, StompConnector};

use crate::common::{history_body, identity, live_body};

const WAIT: Duration = Duration::from_secs(5);

type BrokerSocket = WebSocketStream<TcpStream>;

fn options() -> LinkOptions {
    LinkOptions {
        host: None,
        reconnect_delay: Duration::ZERO,
        heartbeat: (Duration::ZERO, Duration::ZERO),
    }
}

/// Accept one WebSocket upgrade, returning its `Authorization` header.
async fn accept(listener: &TcpListener) -> (BrokerSocket, Option<String>) {
    let (stream, _) = timeout(WAIT, listener.accept())
        .await
        .expect("client dialed")
        .unwrap();
    let mut authorization = None;
    let callback = |request: &Request, response: Response| -> Result<Response, ErrorResponse> {
        authorization = request
            .headers()
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        Ok(response)
    };
    let socket = tokio_tungstenite::accept_hdr_async(stream, callback)
        .await
        .unwrap();
    (socket, authorization)
}

/// Next non-heart-beat frame from the client.
async fn next_frame(socket: &mut BrokerSocket) -> Frame {
    loop {
        let message = timeout(WAIT, socket.next())
            .await
            .expect("frame within timeout")
            .expect("socket open")
            .unwrap();
        if let WsMessage::Text(text) = message {
            if let Some(frame) = Frame::decode(text.as_str()).unwrap() {
                return frame;
            }
        }
    }
}

async fn send_frame(socket: &mut BrokerSocket, frame: Frame) {
    socket
        .send(WsMessage::Text(frame.encode().into()))
        .await
        .unwrap();
}

fn message_frame(subscription: &str, destination: &str, body: String) -> Frame {
    Frame::new(Command::Message)
        .header("subscription", subscription)
        .header("destination", destination)
        .header("message-id", "m-1")
        .header("content-length", body.len().to_string())
        .body(body)
}

/// Apply the next link event to the session.
async fn pump<C: Connector>(
    session: &mut ChatSession<C>,
    events: &mut mpsc::UnboundedReceiver<LinkEvent>,
) -> ChatUpdate {
    let event = timeout(WAIT, events.recv())
        .await
        .expect("event within timeout")
        .expect("link still running");
    session.handle_event(event)
}

#[tokio::test]
async fn test_session_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}/ws-chat", listener.local_addr().unwrap());

    let mut session = ChatSession::new(StompConnector::new(), options(), identity("w1", 42));
    let mut events = tokio_test::assert_ok!(session.connect(&endpoint));

    // Handshake carries the credential on the upgrade and on CONNECT.
    let (mut broker, authorization) = accept(&listener).await;
    assert_eq!(authorization.as_deref(), Some("test-token"));

    let connect = next_frame(&mut broker).await;
    assert_eq!(connect.command, Command::Connect);
    assert_eq!(connect.get("accept-version"), Some("1.2"));
    assert_eq!(connect.get("Authorization"), Some("test-token"));

    send_frame(
        &mut broker,
        Frame::new(Command::Connected)
            .header("version", "1.2")
            .header("heart-beat", "0,0"),
    )
    .await;
    assert_eq!(
        pump(&mut session, &mut events).await,
        ChatUpdate::Ready { session: 1 }
    );

    // Ready: both subscriptions, then the newest history page.
    let live_sub = next_frame(&mut broker).await;
    assert_eq!(live_sub.command, Command::Subscribe);
    assert_eq!(live_sub.get("id"), Some("sub-1-0"));
    assert_eq!(live_sub.get("destination"), Some("/topic/message/w1"));
    assert_eq!(live_sub.get("Authorization"), Some("test-token"));

    let history_sub = next_frame(&mut broker).await;
    assert_eq!(history_sub.get("id"), Some("sub-1-1"));
    assert_eq!(history_sub.get("destination"), Some("/user/topic/history"));

    let request = next_frame(&mut broker).await;
    assert_eq!(request.command, Command::Send);
    assert_eq!(request.get("destination"), Some("/app/history"));
    assert_eq!(request.body, r#"{"lastMsgId":0}"#);

    // Live message first, then the final history page.
    send_frame(
        &mut broker,
        message_frame("sub-1-0", "/topic/message/w1", live_body(1, 42, "hi")),
    )
    .await;
    assert_eq!(
        pump(&mut session, &mut events).await,
        ChatUpdate::Appended { message_id: 1 }
    );

    send_frame(
        &mut broker,
        message_frame("sub-1-1", "/user/topic/history", history_body(&[0], true, 0)),
    )
    .await;
    assert!(matches!(
        pump(&mut session, &mut events).await,
        ChatUpdate::HistoryLoaded { count: 1, .. }
    ));
    let ids: Vec<i64> = session.messages().iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![0, 1]);
    assert!(!session.request_older());

    // Outbound message reaches the broker as a JSON SEND.
    assert!(session.send_text("hello"));
    let sent = next_frame(&mut broker).await;
    assert_eq!(sent.get("destination"), Some("/app/message/w1"));
    assert_eq!(sent.get("content-type"), Some("application/json"));
    assert_eq!(sent.body, r#"{"content":"hello"}"#);

    // Teardown says goodbye.
    session.teardown();
    let goodbye = next_frame(&mut broker).await;
    assert_eq!(goodbye.command, Command::Disconnect);
}

#[tokio::test]
async fn test_broker_close_without_reconnect_ends_link() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}/ws-chat", listener.local_addr().unwrap());

    let mut session = ChatSession::new(StompConnector::new(), options(), identity("w1", 42));
    let mut events = session.connect(&endpoint).unwrap();

    let (mut broker, _) = accept(&listener).await;
    next_frame(&mut broker).await;
    send_frame(&mut broker, Frame::new(Command::Connected).header("version", "1.2")).await;
    pump(&mut session, &mut events).await;

    broker.close(None).await.unwrap();

    assert_eq!(pump(&mut session, &mut events).await, ChatUpdate::Lost);
    // Reconnect delay of zero: the link stops for good.
    pump(&mut session, &mut events).await;
    assert_eq!(session.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_reconnect_after_delay_resubscribes_with_new_session() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}/ws-chat", listener.local_addr().unwrap());

    let mut session = ChatSession::new(
        StompConnector::new(),
        LinkOptions {
            reconnect_delay: Duration::from_millis(50),
            ..options()
        },
        identity("w1", 42),
    );
    let mut events = session.connect(&endpoint).unwrap();

    let (mut broker, _) = accept(&listener).await;
    next_frame(&mut broker).await;
    send_frame(&mut broker, Frame::new(Command::Connected).header("version", "1.2")).await;
    assert_eq!(
        pump(&mut session, &mut events).await,
        ChatUpdate::Ready { session: 1 }
    );
    for _ in 0..3 {
        next_frame(&mut broker).await;
    }

    broker.close(None).await.unwrap();
    drop(broker);
    assert_eq!(pump(&mut session, &mut events).await, ChatUpdate::Lost);
    assert_eq!(session.state(), ConnectionState::Reconnecting);

    // The link dials again after the delay and repeats the handshake.
    let (mut broker, authorization) = accept(&listener).await;
    assert_eq!(authorization.as_deref(), Some("test-token"));
    let connect = next_frame(&mut broker).await;
    assert_eq!(connect.command, Command::Connect);
    send_frame(&mut broker, Frame::new(Command::Connected).header("version", "1.2")).await;
    assert_eq!(
        pump(&mut session, &mut events).await,
        ChatUpdate::Ready { session: 2 }
    );

    let live_sub = next_frame(&mut broker).await;
    assert_eq!(live_sub.get("id"), Some("sub-2-0"));
    assert_eq!(live_sub.get("destination"), Some("/topic/message/w1"));
    let history_sub = next_frame(&mut broker).await;
    assert_eq!(history_sub.get("id"), Some("sub-2-1"));
    let request = next_frame(&mut broker).await;
    assert_eq!(request.get("destination"), Some("/app/history"));
    assert_eq!(request.body, r#"{"lastMsgId":0}"#);

    // Frames on the new session route; the old ids are stale.
    send_frame(
        &mut broker,
        message_frame("sub-2-0", "/topic/message/w1", live_body(5, 7, "back")),
    )
    .await;
    assert_eq!(
        pump(&mut session, &mut events).await,
        ChatUpdate::Appended { message_id: 5 }
    );

    session.teardown();
}
