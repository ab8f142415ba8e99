//! Subscription Multiplexer
//!
//! Subscribes to the live and history topics once a broker session is ready
//! and routes incoming frames to the right decoder. Subscription ids are
//! scoped to the broker session, so frames for a previous session's
//! subscriptions never reach a handler.

use std::collections::HashMap;

use crate::application::dto::{decode_history, decode_live, HistoryPage};
use crate::application::services::HistoryPager;
use crate::domain::entities::{BrokerLink, CredentialHeader, Message, SubscriptionId, Topic};
use crate::infrastructure::metrics;
use crate::shared::error::ChatError;

/// Which feed a subscription belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Live,
    History,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Live => "live",
            Route::History => "history",
        }
    }
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Live(Message),
    History(HistoryPage),
}

/// Routes subscription ids of the current broker session.
#[derive(Debug, Default)]
pub struct SubscriptionMultiplexer {
    routes: HashMap<SubscriptionId, Route>,
    session: Option<u64>,
}

impl SubscriptionMultiplexer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe both feeds for a fresh broker session, then ask for the
    /// newest history page.
    ///
    /// Routes of any earlier session are discarded first.
    pub fn on_ready<L: BrokerLink>(
        &mut self,
        link: &L,
        session: u64,
        workspace_id: &str,
        credential: &CredentialHeader,
        pager: &HistoryPager,
    ) -> Result<(), ChatError> {
        self.reset();
        self.session = Some(session);

        let headers = [credential.to_header()];
        let topics = [
            (Route::Live, Topic::Live {
                workspace_id: workspace_id.to_string(),
            }),
            (Route::History, Topic::History),
        ];

        for (sequence, (route, topic)) in topics.into_iter().enumerate() {
            let id = SubscriptionId::scoped(session, sequence as u64);
            link.subscribe(&id, &topic.path(), &headers)?;
            tracing::debug!(subscription = %id, topic = %topic.path(), "Subscribed");
            self.routes.insert(id, route);
        }

        pager.request_history(Some(link), 0);
        Ok(())
    }

    /// Decode a frame delivered on `subscription`.
    ///
    /// Frames for unknown or stale subscriptions yield `Ok(None)`. A body
    /// that does not match the feed's shape is an error; the caller drops it.
    pub fn route(
        &self,
        subscription: &SubscriptionId,
        body: &str,
    ) -> Result<Option<Inbound>, ChatError> {
        let Some(route) = self.routes.get(subscription) else {
            tracing::debug!(subscription = %subscription, "Frame for stale subscription dropped");
            return Ok(None);
        };

        metrics::record_inbound(route.as_str());
        let decoded = match route {
            Route::Live => decode_live(body).map(Inbound::Live),
            Route::History => decode_history(body).map(Inbound::History),
        };
        decoded.map(Some).inspect_err(|_| metrics::record_decode_failure())
    }

    /// Forget every route; subscriptions died with the connection.
    pub fn reset(&mut self) {
        self.routes.clear();
        self.session = None;
    }

    pub fn route_of(&self, subscription: &SubscriptionId) -> Option<Route> {
        self.routes.get(subscription).copied()
    }

    pub fn session(&self) -> Option<u64> {
        self.session
    }

    pub fn is_subscribed(&self) -> bool {
        !self.routes.is_empty()
    }
}
