//! Chat Session
//!
//! Session-scoped controller owning the connection, the store and the
//! pagination cursor. Every link event is applied here, one at a time, in
//! arrival order; nothing else mutates chat state.

use tokio::sync::mpsc;

use crate::application::services::{
    ConnectionManager, ConnectionState, HistoryPager, Inbound, KeyOutcome, KeyPress, Lifecycle,
    LinkOptions, OutboundPublisher, SubscriptionMultiplexer,
};
use crate::domain::entities::{
    AccessTokenProvider, Connector, CredentialHeader, LinkEvent, Message, MessageView,
    PaginationCursor, WorkspaceDirectory,
};
use crate::domain::services::MessageStore;
use crate::shared::error::ChatError;

/// Who the session chats as, resolved before connecting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatIdentity {
    pub workspace_id: String,
    pub user_id: i64,
    pub user_name: Option<String>,
    pub credential: CredentialHeader,
}

impl ChatIdentity {
    /// Resolve workspace, current user and credential from the collaborators.
    pub async fn resolve(
        directory: &dyn WorkspaceDirectory,
        tokens: &dyn AccessTokenProvider,
    ) -> Result<Self, ChatError> {
        let workspace = directory.workspace_info().await?;
        if workspace.workspace_id.trim().is_empty() {
            return Err(ChatError::Collaborator("workspace id is empty".into()));
        }
        let members = directory.members().await?;
        let me = members
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Collaborator("workspace has no members".into()))?;
        let credential = CredentialHeader::new(tokens.access_token().await?);
        if credential.is_empty() {
            return Err(ChatError::Collaborator("access token is empty".into()));
        }

        Ok(Self {
            workspace_id: workspace.workspace_id,
            user_id: me.user_id,
            user_name: me.name,
            credential,
        })
    }
}

/// What handling one link event changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatUpdate {
    /// Subscriptions (re)created for broker session `session`
    Ready { session: u64 },
    /// Broker session `session` is up but its subscriptions could not be
    /// created; nothing will be routed until the next ready
    SubscribeFailed { session: u64 },
    /// Connection lost; waiting for the link to reconnect
    Lost,
    /// A live message was appended
    Appended { message_id: i64 },
    /// A history page was prepended
    HistoryLoaded {
        count: usize,
        cursor: PaginationCursor,
    },
    /// A frame could not be decoded and was dropped
    Dropped,
    /// Nothing visible changed
    Ignored,
}

/// One chat page: connection, subscriptions, history, store and composer.
pub struct ChatSession<C: Connector> {
    identity: ChatIdentity,
    connection: ConnectionManager<C>,
    multiplexer: SubscriptionMultiplexer,
    pager: HistoryPager,
    store: MessageStore,
    publisher: OutboundPublisher,
    torn_down: bool,
}

impl<C: Connector> ChatSession<C> {
    pub fn new(connector: C, options: LinkOptions, identity: ChatIdentity) -> Self {
        Self {
            identity,
            connection: ConnectionManager::new(connector, options),
            multiplexer: SubscriptionMultiplexer::new(),
            pager: HistoryPager::new(),
            store: MessageStore::new(),
            publisher: OutboundPublisher::new(),
            torn_down: false,
        }
    }

    /// Resolve the identity, then connect to `endpoint`.
    pub async fn start(
        connector: C,
        options: LinkOptions,
        endpoint: &str,
        directory: &dyn WorkspaceDirectory,
        tokens: &dyn AccessTokenProvider,
    ) -> Result<(Self, mpsc::UnboundedReceiver<LinkEvent>), ChatError> {
        let identity = ChatIdentity::resolve(directory, tokens).await?;
        tracing::info!(
            workspace_id = %identity.workspace_id,
            user_id = identity.user_id,
            "Chat identity resolved"
        );
        let mut session = Self::new(connector, options, identity);
        let events = session.connect(endpoint)?;
        Ok((session, events))
    }

    pub fn connect(
        &mut self,
        endpoint: &str,
    ) -> Result<mpsc::UnboundedReceiver<LinkEvent>, ChatError> {
        if self.torn_down {
            return Err(ChatError::Precondition("session was torn down".into()));
        }
        if self.identity.workspace_id.trim().is_empty() {
            return Err(ChatError::Precondition("workspace id is empty".into()));
        }
        self.connection
            .connect(endpoint, self.identity.credential.clone())
    }

    /// Apply one link event. A no-op once the session is torn down.
    pub fn handle_event(&mut self, event: LinkEvent) -> ChatUpdate {
        if self.torn_down {
            return ChatUpdate::Ignored;
        }

        match self.connection.on_event(&event) {
            Lifecycle::Ready { session } => return self.on_ready(session),
            Lifecycle::Lost => {
                self.multiplexer.reset();
                return ChatUpdate::Lost;
            }
            Lifecycle::Unchanged => {}
        }

        let LinkEvent::Message {
            subscription, body, ..
        } = event
        else {
            return ChatUpdate::Ignored;
        };

        match self.multiplexer.route(&subscription, &body) {
            Ok(Some(Inbound::Live(message))) => {
                let message_id = message.id;
                self.store.append(message);
                ChatUpdate::Appended { message_id }
            }
            Ok(Some(Inbound::History(page))) => {
                self.pager
                    .update_cursor(page.cursor.last_msg_id, page.cursor.end);
                let count = page.messages.len();
                self.store.prepend_batch(page.messages);
                tracing::debug!(
                    count,
                    last_msg_id = page.cursor.last_msg_id,
                    end = page.cursor.end,
                    "History page loaded"
                );
                ChatUpdate::HistoryLoaded {
                    count,
                    cursor: page.cursor,
                }
            }
            Ok(None) => ChatUpdate::Ignored,
            Err(e) => {
                tracing::warn!(error = %e, subscription = %subscription, "Dropping undecodable frame");
                ChatUpdate::Dropped
            }
        }
    }

    /// Resync for a fresh broker session: the store and cursor restart and
    /// the newest page is requested again.
    fn on_ready(&mut self, session: u64) -> ChatUpdate {
        self.store.clear();
        self.pager.reset();

        let Some(link) = self.connection.link() else {
            return ChatUpdate::Ignored;
        };
        if let Err(e) = self.multiplexer.on_ready(
            link,
            session,
            &self.identity.workspace_id,
            &self.identity.credential,
            &self.pager,
        ) {
            if e.is_recoverable() {
                tracing::warn!(error = %e, session, "Subscribing failed");
            } else {
                tracing::error!(error = %e, session, "Subscribing failed");
            }
            self.multiplexer.reset();
            return ChatUpdate::SubscribeFailed { session };
        }
        ChatUpdate::Ready { session }
    }

    /// Send the composer input.
    pub fn send(&mut self) -> bool {
        if self.torn_down {
            return false;
        }
        self.publisher
            .send(self.connection.link(), &self.identity.workspace_id)
    }

    /// Replace the composer input and send it.
    pub fn send_text(&mut self, content: impl Into<String>) -> bool {
        self.publisher.set_input(content);
        self.send()
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.publisher.set_input(input);
    }

    pub fn input(&self) -> &str {
        self.publisher.input()
    }

    pub fn handle_key(&mut self, press: KeyPress) -> KeyOutcome {
        if self.torn_down {
            return KeyOutcome::PassThrough;
        }
        self.publisher
            .handle_key(press, self.connection.link(), &self.identity.workspace_id)
    }

    /// Request the page before `cursor_id`.
    pub fn request_history(&self, cursor_id: i64) -> bool {
        !self.torn_down && self.pager.request_history(self.connection.link(), cursor_id)
    }

    /// Request the page before the oldest loaded message.
    pub fn request_older(&self) -> bool {
        !self.torn_down && self.pager.request_older(self.connection.link())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.store.to_vec()
    }

    /// Messages classified against the current user.
    pub fn views(&self) -> Vec<MessageView<'_>> {
        self.store.views(self.identity.user_id)
    }

    pub fn store(&self) -> &MessageStore {
        &self.store
    }

    pub fn cursor(&self) -> PaginationCursor {
        self.pager.cursor()
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn identity(&self) -> &ChatIdentity {
        &self.identity
    }

    /// Deactivate the connection. Later events are ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.connection.disconnect();
        self.multiplexer.reset();
        tracing::info!("Chat session torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}
