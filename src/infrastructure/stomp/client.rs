//! STOMP over WebSocket transport.
//!
//! `StompConnector::activate` spawns one task that owns the socket. The task
//! reads frames in order and forwards them on a single unbounded channel, so
//! the consumer sees each subscription in arrival order. Lost sockets are
//! retried after a fixed delay; every successful CONNECTED starts a new
//! broker session number.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::{header::AUTHORIZATION, HeaderValue};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use uuid::Uuid;

use super::frame::{Command, Frame};
use crate::domain::entities::{BrokerLink, ConnectTarget, Connector, LinkEvent, SubscriptionId};
use crate::infrastructure::metrics;
use crate::shared::error::ChatError;

/// How a single socket lifetime ended.
enum Exit {
    /// Link deactivated or event consumer gone
    Shutdown,
    /// Socket lost; reconnect if allowed
    Closed(String),
}

/// Builds `StompLink`s on the current tokio runtime.
#[derive(Debug, Clone, Default)]
pub struct StompConnector;

impl StompConnector {
    pub fn new() -> Self {
        Self
    }
}

impl Connector for StompConnector {
    type Link = StompLink;

    fn activate(
        &self,
        target: ConnectTarget,
    ) -> Result<(StompLink, mpsc::UnboundedReceiver<LinkEvent>), ChatError> {
        if !target.endpoint.starts_with("ws://") && !target.endpoint.starts_with("wss://") {
            return Err(ChatError::Precondition(format!(
                "broker endpoint must be a ws:// or wss:// URL: {}",
                target.endpoint
            )));
        }
        HeaderValue::from_str(target.credential.token()).map_err(|_| {
            ChatError::Precondition("credential is not a valid header value".into())
        })?;

        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(connection_task(target, frame_rx, event_tx, shutdown_rx));

        Ok((
            StompLink {
                frame_tx,
                shutdown_tx,
                task: Some(task),
            },
            event_rx,
        ))
    }
}

/// Handle to a running STOMP connection task.
pub struct StompLink {
    frame_tx: mpsc::UnboundedSender<Frame>,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl StompLink {
    fn enqueue(&self, frame: Frame) -> Result<(), ChatError> {
        self.frame_tx
            .send(frame)
            .map_err(|_| ChatError::NotConnected)
    }

}

impl BrokerLink for StompLink {
    fn subscribe(
        &self,
        id: &SubscriptionId,
        topic: &str,
        headers: &[(String, String)],
    ) -> Result<(), ChatError> {
        self.enqueue(Frame::subscribe(id.as_str(), topic, headers))
    }

    fn publish(&self, destination: &str, body: String) -> Result<(), ChatError> {
        self.enqueue(Frame::send(destination, body))
    }

    fn deactivate(&mut self) {
        if self.task.take().is_some() {
            let _ = self.shutdown_tx.send(true);
            tracing::debug!("STOMP link deactivated");
        }
    }
}

impl Drop for StompLink {
    fn drop(&mut self) {
        self.deactivate();
    }
}

/// Connection loop: connect, serve, wait the reconnect delay, repeat.
async fn connection_task(
    target: ConnectTarget,
    mut frame_rx: mpsc::UnboundedReceiver<Frame>,
    event_tx: mpsc::UnboundedSender<LinkEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let client_id = Uuid::new_v4();
    let mut session: u64 = 0;

    tracing::info!(
        client_id = %client_id,
        endpoint = %target.endpoint,
        reconnect_delay_ms = target.reconnect_delay.as_millis() as u64,
        "Starting STOMP connection task"
    );

    loop {
        if *shutdown.borrow() {
            break;
        }

        let exit = match serve_connection(
            &target,
            &mut frame_rx,
            &event_tx,
            &mut shutdown,
            &mut session,
        )
        .await
        {
            Ok(exit) => exit,
            Err(e) => Exit::Closed(e.to_string()),
        };

        let reason = match exit {
            Exit::Shutdown => break,
            Exit::Closed(reason) => reason,
        };

        metrics::set_connection_ready(false);
        tracing::warn!(client_id = %client_id, reason = %reason, "Broker connection lost");
        if event_tx.send(LinkEvent::Closed { reason }).is_err() {
            break;
        }

        if target.reconnect_delay.is_zero() {
            tracing::info!(client_id = %client_id, "Reconnect disabled, stopping");
            break;
        }

        if !wait_reconnect_delay(target.reconnect_delay, &mut frame_rx, &mut shutdown).await {
            break;
        }
        metrics::record_reconnect();
        tracing::info!(client_id = %client_id, "Reconnecting to broker");
    }

    metrics::set_connection_ready(false);
    let _ = event_tx.send(LinkEvent::Deactivated);
    tracing::info!(client_id = %client_id, "STOMP connection task stopped");
}

/// Sleep for `delay`, dropping frames queued meanwhile.
///
/// Returns false when the link was deactivated during the wait.
async fn wait_reconnect_delay(
    delay: Duration,
    frame_rx: &mut mpsc::UnboundedReceiver<Frame>,
    shutdown: &mut watch::Receiver<bool>,
) -> bool {
    let sleep = tokio::time::sleep(delay);
    tokio::pin!(sleep);

    loop {
        tokio::select! {
            _ = &mut sleep => return true,
            _ = shutdown.changed() => return false,
            frame = frame_rx.recv() => match frame {
                Some(frame) => {
                    tracing::warn!(command = %frame.command, "Dropping frame queued while disconnected");
                }
                None => return false,
            },
        }
    }
}

/// One socket lifetime: upgrade, CONNECT, then pump frames both ways.
async fn serve_connection(
    target: &ConnectTarget,
    frame_rx: &mut mpsc::UnboundedReceiver<Frame>,
    event_tx: &mpsc::UnboundedSender<LinkEvent>,
    shutdown: &mut watch::Receiver<bool>,
    session: &mut u64,
) -> Result<Exit, ChatError> {
    let mut request = target.endpoint.as_str().into_client_request()?;
    let credential = HeaderValue::from_str(target.credential.token())
        .map_err(|_| ChatError::Precondition("credential is not a valid header value".into()))?;
    request.headers_mut().insert(AUTHORIZATION, credential);

    let host = target
        .host
        .clone()
        .or_else(|| request.uri().host().map(str::to_string))
        .unwrap_or_else(|| "localhost".to_string());

    let (ws, _) = tokio::select! {
        result = tokio_tungstenite::connect_async(request) => result?,
        _ = shutdown.changed() => return Ok(Exit::Shutdown),
    };
    tracing::debug!(endpoint = %target.endpoint, "WebSocket opened");

    let (mut write, mut read) = ws.split();

    let connect = Frame::connect(&host, target.heartbeat, &[target.credential.to_header()]);
    tracing::trace!(command = %connect.command, "Sending frame");
    write.send(WsMessage::Text(connect.encode().into())).await?;

    let mut connected = false;
    let mut outgoing_beat: Option<Interval> = None;
    let mut incoming_check: Option<(Interval, Duration)> = None;
    let mut last_received = Instant::now();

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if connected {
                    let _ = write
                        .send(WsMessage::Text(Frame::disconnect().encode().into()))
                        .await;
                }
                let _ = write.close().await;
                return Ok(Exit::Shutdown);
            }

            frame = frame_rx.recv() => {
                let Some(frame) = frame else {
                    let _ = write.close().await;
                    return Ok(Exit::Shutdown);
                };
                if !connected {
                    tracing::warn!(command = %frame.command, "Dropping frame queued before CONNECTED");
                    continue;
                }
                tracing::trace!(command = %frame.command, destination = ?frame.get("destination"), "Sending frame");
                if frame.command == Command::Send {
                    if let Some(destination) = frame.get("destination") {
                        metrics::record_publish(destination_kind(destination));
                    }
                }
                write.send(WsMessage::Text(frame.encode().into())).await?;
            }

            _ = tick(&mut outgoing_beat) => {
                write.send(WsMessage::Text("\n".to_string().into())).await?;
            }

            _ = tick_check(&mut incoming_check) => {
                if let Some((_, period)) = &incoming_check {
                    if last_received.elapsed() > *period * 2 {
                        let _ = write.close().await;
                        return Ok(Exit::Closed("heart-beat timeout".into()));
                    }
                }
            }

            message = read.next() => {
                let text = match message {
                    Some(Ok(WsMessage::Text(text))) => text.as_str().to_string(),
                    Some(Ok(WsMessage::Binary(bytes))) => String::from_utf8_lossy(&bytes).into_owned(),
                    Some(Ok(WsMessage::Close(frame))) => {
                        let reason = frame
                            .map(|f| format!("closed by broker: {} {}", u16::from(f.code), f.reason.as_str()))
                            .unwrap_or_else(|| "closed by broker".to_string());
                        return Ok(Exit::Closed(reason));
                    }
                    Some(Ok(_)) => {
                        last_received = Instant::now();
                        continue;
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Ok(Exit::Closed("stream ended".into())),
                };
                last_received = Instant::now();

                for decoded in Frame::decode_all(&text) {
                    let frame = match decoded {
                        Ok(frame) => frame,
                        Err(e) => {
                            metrics::record_decode_failure();
                            tracing::warn!(error = %e, "Dropping malformed STOMP frame");
                            continue;
                        }
                    };
                    tracing::trace!(command = %frame.command, "Received frame");

                    let event = match frame.command {
                        Command::Connected => {
                            connected = true;
                            *session += 1;
                            let (outgoing, incoming) = frame.negotiate_heartbeat(target.heartbeat);
                            outgoing_beat = heartbeat_interval(outgoing);
                            incoming_check = heartbeat_interval(incoming).map(|i| (i, incoming));
                            metrics::set_connection_ready(true);
                            tracing::info!(
                                session = *session,
                                version = ?frame.get("version"),
                                outgoing_heartbeat_ms = outgoing.as_millis() as u64,
                                incoming_heartbeat_ms = incoming.as_millis() as u64,
                                "Connected to broker"
                            );
                            LinkEvent::Connected { session: *session }
                        }
                        Command::Message => match frame.get("subscription") {
                            Some(subscription) => LinkEvent::Message {
                                subscription: SubscriptionId::from(subscription),
                                destination: frame.get("destination").unwrap_or_default().to_string(),
                                body: frame.body,
                            },
                            None => {
                                tracing::warn!("Dropping MESSAGE frame without subscription header");
                                continue;
                            }
                        },
                        Command::Error => LinkEvent::BrokerError {
                            message: frame.get("message").unwrap_or_default().to_string(),
                            body: frame.body,
                        },
                        Command::Receipt => {
                            tracing::debug!(receipt_id = ?frame.get("receipt-id"), "Receipt");
                            continue;
                        }
                        other => {
                            tracing::debug!(command = %other, "Ignoring unexpected frame");
                            continue;
                        }
                    };

                    if event_tx.send(event).is_err() {
                        let _ = write.close().await;
                        return Ok(Exit::Shutdown);
                    }
                }
            }
        }
    }
}

fn destination_kind(destination: &str) -> &'static str {
    if destination.starts_with("/app/history") {
        "history"
    } else if destination.starts_with("/app/message/") {
        "message"
    } else {
        "other"
    }
}

fn heartbeat_interval(period: Duration) -> Option<Interval> {
    if period.is_zero() {
        return None;
    }
    let mut beat = interval(period);
    beat.set_missed_tick_behavior(MissedTickBehavior::Delay);
    Some(beat)
}

async fn tick(beat: &mut Option<Interval>) {
    match beat {
        Some(beat) => {
            beat.tick().await;
        }
        None => std::future::pending().await,
    }
}

async fn tick_check(check: &mut Option<(Interval, Duration)>) {
    match check {
        Some((beat, _)) => {
            beat.tick().await;
        }
        None => std::future::pending().await,
    }
}
