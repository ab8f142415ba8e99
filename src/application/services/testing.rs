//! Recording link used by the service unit tests.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::domain::entities::{BrokerLink, ConnectTarget, Connector, LinkEvent, SubscriptionId};
use crate::shared::error::ChatError;

/// A frame the code under test handed to the link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Subscribe {
        id: SubscriptionId,
        topic: String,
        headers: Vec<(String, String)>,
    },
    Publish {
        destination: String,
        body: String,
    },
}

/// Shared log of everything sent through recording links.
#[derive(Debug, Clone, Default)]
pub struct Wire {
    sent: Arc<Mutex<Vec<Sent>>>,
    deactivations: Arc<Mutex<usize>>,
    fail_subscriptions: Arc<Mutex<bool>>,
}

impl Wire {
    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    pub fn publishes(&self) -> Vec<(String, String)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Publish { destination, body } => Some((destination.clone(), body.clone())),
                Sent::Subscribe { .. } => None,
            })
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<(SubscriptionId, String)> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Subscribe { id, topic, .. } => Some((id.clone(), topic.clone())),
                Sent::Publish { .. } => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }

    pub fn deactivations(&self) -> usize {
        *self.deactivations.lock()
    }

    /// Make every later subscribe fail as if the link had dropped.
    pub fn fail_subscriptions(&self, fail: bool) {
        *self.fail_subscriptions.lock() = fail;
    }
}

pub struct RecordingLink {
    wire: Wire,
    active: bool,
}

impl RecordingLink {
    pub fn new(wire: Wire) -> Self {
        Self { wire, active: true }
    }
}

impl BrokerLink for RecordingLink {
    fn subscribe(
        &self,
        id: &SubscriptionId,
        topic: &str,
        headers: &[(String, String)],
    ) -> Result<(), ChatError> {
        if !self.active || *self.wire.fail_subscriptions.lock() {
            return Err(ChatError::NotConnected);
        }
        self.wire.sent.lock().push(Sent::Subscribe {
            id: id.clone(),
            topic: topic.to_string(),
            headers: headers.to_vec(),
        });
        Ok(())
    }

    fn publish(&self, destination: &str, body: String) -> Result<(), ChatError> {
        if !self.active {
            return Err(ChatError::NotConnected);
        }
        self.wire.sent.lock().push(Sent::Publish {
            destination: destination.to_string(),
            body,
        });
        Ok(())
    }

    fn deactivate(&mut self) {
        if self.active {
            self.active = false;
            *self.wire.deactivations.lock() += 1;
        }
    }
}

/// Connector handing out recording links.
#[derive(Debug, Clone, Default)]
pub struct RecordingConnector {
    pub wire: Wire,
    targets: Arc<Mutex<Vec<ConnectTarget>>>,
    senders: Arc<Mutex<Vec<mpsc::UnboundedSender<LinkEvent>>>>,
}

impl RecordingConnector {
    pub fn activations(&self) -> usize {
        self.targets.lock().len()
    }

    pub fn last_target(&self) -> Option<ConnectTarget> {
        self.targets.lock().last().cloned()
    }
}

impl Connector for RecordingConnector {
    type Link = RecordingLink;

    fn activate(
        &self,
        target: ConnectTarget,
    ) -> Result<(RecordingLink, mpsc::UnboundedReceiver<LinkEvent>), ChatError> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.targets.lock().push(target);
        self.senders.lock().push(tx);
        Ok((RecordingLink::new(self.wire.clone()), rx))
    }
}
