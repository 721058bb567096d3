//! Message exchange client.
//!
//! One [`ChatClient`] per signed-in session. All mutable session state sits in
//! a single `RwLock`; background tasks hold an `Arc` to it and never keep the
//! lock across a network await. Poll responses carry the selection generation
//! they were issued under and are dropped when it is no longer current.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::codec::encode;
use crate::config::ClientConfig;
use crate::directory::{build_directory, contacts_for, resolve_self, Directory};
use crate::error::Result;
use crate::identity::{Identity, Role};
use crate::models::{
    Attachment, Group, Message, MessageBody, MessageQuery, NewGroup, OutgoingMessage,
};
use crate::render::{RenderContext, RenderedMessage};
use crate::selector::{ConversationSelector, ConversationTarget, Generation};
use crate::transport::ChatTransport;

/// What the user is about to send.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composer {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Composer {
    /// Blank text and no attachment.
    pub fn is_empty(&self) -> bool {
        self.attachment.is_none() && self.text.trim().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Blank text and no attachment; nothing was written.
    NothingToSend,
    /// No conversation selected.
    NoTarget,
}

/// Read-only view of the session for front-ends.
#[derive(Debug, Clone, Serialize)]
pub struct ChatView {
    pub role: Role,
    pub display_name: String,
    pub wire_identity: String,
    pub contacts: Vec<Identity>,
    pub groups: Vec<Group>,
    pub selection: Option<ConversationTarget>,
    /// Display label of the selection (`#name` for groups).
    pub selection_label: Option<String>,
    pub messages: Vec<RenderedMessage>,
    pub composer_text: String,
    pub pending_attachment: Option<String>,
    pub hide_encrypted: bool,
}

/// Aborts the wrapped task when dropped.
#[derive(Debug)]
pub struct PollHandle(JoinHandle<()>);

impl PollHandle {
    pub fn is_finished(&self) -> bool {
        self.0.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

#[derive(Debug)]
struct ClientState {
    role: Role,
    display_name: String,
    wire_identity: String,
    directory: Directory,
    selector: ConversationSelector,
    messages: Vec<Message>,
    composer: Composer,
    groups: Vec<Group>,
    hide_encrypted: bool,
}

impl ClientState {
    fn new(display_name: String) -> Self {
        Self {
            role: Role::for_display_name(&display_name),
            wire_identity: display_name.clone(),
            display_name,
            directory: Directory::default(),
            selector: ConversationSelector::new(),
            messages: Vec::new(),
            composer: Composer::default(),
            groups: Vec::new(),
            hide_encrypted: false,
        }
    }

    /// Read scope for the current selection, if any.
    fn query(&self) -> Option<MessageQuery> {
        if self.role.is_observer() {
            return Some(MessageQuery::Everything {
                observer: self.wire_identity.clone(),
            });
        }
        match self.selector.current()? {
            ConversationTarget::Peer(wire) => Some(MessageQuery::Conversation {
                from: self.wire_identity.clone(),
                to: wire.clone(),
            }),
            ConversationTarget::Group(name) => Some(MessageQuery::Group {
                group: name.clone(),
            }),
        }
    }

    fn render_context(&self) -> RenderContext<'_> {
        RenderContext {
            directory: &self.directory,
            local_wire: &self.wire_identity,
            local_display: &self.display_name,
            role: self.role,
            hide_encrypted: self.hide_encrypted,
        }
    }
}

/// State shared with background tasks.
struct Shared<T> {
    transport: Arc<T>,
    state: RwLock<ClientState>,
    updates: watch::Sender<u64>,
}

impl<T: ChatTransport> Shared<T> {
    fn notify(&self) {
        self.updates.send_modify(|tick| *tick += 1);
    }

    /// Reload the roster. Returns true when the local identity moved off the
    /// plain-name fallback onto a roster entry.
    async fn refresh_directory(&self) -> bool {
        let (directory, loaded) = match self.transport.fetch_roster().await {
            Ok(roster) => (
                build_directory(roster.into_iter().map(|entry| entry.username)),
                true,
            ),
            Err(e) => {
                warn!("[ChatClient] Roster unavailable: {}", e);
                (Directory::default(), false)
            }
        };
        debug!("[ChatClient] Directory refreshed ({} entries)", directory.len());

        let mut state = self.state.write().await;
        state.directory = directory;

        let mut rebound = false;
        if loaded && state.wire_identity == state.display_name {
            let resolved = resolve_self(&state.directory, &state.display_name, state.role);
            if resolved != state.wire_identity {
                info!("[ChatClient] Local identity resolved from roster");
                state.wire_identity = resolved;
                state.messages.clear();
                rebound = true;
            }
        }
        drop(state);

        self.notify();
        rebound
    }

    /// Reload the directory; after a rebind, re-read everything keyed on the
    /// local identity.
    async fn reload_directory(&self) {
        if self.refresh_directory().await {
            self.refresh_groups().await;
            let generation = self.state.read().await.selector.generation();
            self.poll_once(generation).await;
        }
    }

    /// One read for `generation`. Returns false once the generation is stale.
    async fn poll_once(&self, generation: Generation) -> bool {
        let (query, identity) = {
            let state = self.state.read().await;
            if !state.selector.is_current(generation) {
                return false;
            }
            match state.query() {
                Some(query) => (query, state.wire_identity.clone()),
                None => return true,
            }
        };

        let messages = match self.transport.fetch_messages(&query).await {
            Ok(records) => records
                .into_iter()
                .filter_map(|record| match Message::try_from(record) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        warn!("[ChatClient] Dropping record: {}", e);
                        None
                    }
                })
                .collect(),
            Err(e) => {
                warn!("[ChatClient] Message read failed: {}", e);
                Vec::new()
            }
        };

        let mut state = self.state.write().await;
        if !state.selector.is_current(generation) {
            debug!(
                "[ChatClient] Discarding stale response for generation {} (now {})",
                generation,
                state.selector.generation()
            );
            return false;
        }
        if state.wire_identity != identity {
            debug!("[ChatClient] Discarding response read under a previous identity");
            return true;
        }
        state.messages = messages;
        drop(state);

        self.notify();
        true
    }

    async fn refresh_groups(&self) {
        let member = {
            let state = self.state.read().await;
            if state.role.is_observer() {
                return;
            }
            state.wire_identity.clone()
        };

        let groups = match self.transport.fetch_groups(&member).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!("[ChatClient] Groups unavailable: {}", e);
                Vec::new()
            }
        };
        self.state.write().await.groups = groups;
        self.notify();
    }
}

pub struct ChatClient<T: ChatTransport> {
    shared: Arc<Shared<T>>,
    config: ClientConfig,
    poll: Mutex<Option<PollHandle>>,
    directory_task: Mutex<Option<PollHandle>>,
}

impl<T: ChatTransport> ChatClient<T> {
    /// Create a client for `display_name`. The role is fixed here.
    pub fn new(transport: Arc<T>, config: ClientConfig, display_name: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                transport,
                state: RwLock::new(ClientState::new(display_name.into())),
                updates,
            }),
            config,
            poll: Mutex::new(None),
            directory_task: Mutex::new(None),
        }
    }

    pub async fn role(&self) -> Role {
        self.shared.state.read().await.role
    }

    /// Wire identity the session sends and reads as.
    pub async fn wire_identity(&self) -> String {
        self.shared.state.read().await.wire_identity.clone()
    }

    /// Load the directory, resolve the local identity and start the timers
    /// that run for the whole session.
    pub async fn start(&self) {
        // Resolves the wire identity when the roster is reachable; otherwise
        // the display name stands in until a later refresh succeeds.
        self.shared.refresh_directory().await;

        let role = {
            let state = self.shared.state.read().await;
            info!(
                "[ChatClient] Session started for {} ({:?})",
                state.display_name, state.role
            );
            state.role
        };

        if let Some(period) = self.config.directory_refresh_interval {
            *self.directory_task.lock().await = Some(self.spawn_directory_refresh(period));
        }

        match role {
            Role::Observer => {
                let mut slot = self.poll.lock().await;
                let generation = self.shared.state.read().await.selector.generation();
                *slot = Some(self.spawn_poll(generation));
            }
            Role::Standard => self.shared.refresh_groups().await,
        }
    }

    pub async fn refresh_directory(&self) {
        self.shared.reload_directory().await;
    }

    /// Directory minus the local user. Always empty for the observer.
    pub async fn contacts(&self) -> Vec<Identity> {
        let state = self.shared.state.read().await;
        if state.role.is_observer() {
            return Vec::new();
        }
        contacts_for(&state.directory, &state.display_name)
    }

    pub async fn select_peer(&self, wire: impl Into<String>) {
        let wire = wire.into();
        self.transition(|selector| selector.select_peer(wire)).await;
    }

    /// Select a contact by the name the user sees. Returns false if unknown.
    pub async fn select_contact(&self, display: &str) -> bool {
        let wire = {
            let state = self.shared.state.read().await;
            state
                .directory
                .find_by_display(display)
                .filter(|_| display != state.display_name)
                .map(|identity| identity.wire.clone())
        };
        match wire {
            Some(wire) => {
                self.select_peer(wire).await;
                true
            }
            None => false,
        }
    }

    pub async fn select_group(&self, name: impl Into<String>) {
        let name = name.into();
        self.transition(|selector| selector.select_group(name)).await;
    }

    pub async fn deselect(&self) {
        self.transition(|selector| selector.deselect()).await;
    }

    /// Apply a selector transition and restart polling under the new generation.
    async fn transition<F>(&self, apply: F)
    where
        F: FnOnce(&mut ConversationSelector) -> Generation,
    {
        // Held for the whole transition so the slot always matches the
        // current generation.
        let mut slot = self.poll.lock().await;

        let (generation, selected) = {
            let mut state = self.shared.state.write().await;
            if state.role.is_observer() {
                info!("[ChatClient] Ignoring selection change in observer mode");
                return;
            }
            let generation = apply(&mut state.selector);
            state.messages.clear();
            (generation, state.selector.is_selected())
        };
        self.shared.notify();

        // Dropping the old handle aborts its task.
        *slot = if selected {
            Some(self.spawn_poll(generation))
        } else {
            None
        };
    }

    fn spawn_poll(&self, generation: Generation) -> PollHandle {
        let shared = self.shared.clone();
        let period = self.config.poll_interval;
        PollHandle(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !shared.poll_once(generation).await {
                    debug!("[ChatClient] Poll task for generation {} exiting", generation);
                    break;
                }
            }
        }))
    }

    fn spawn_directory_refresh(&self, period: Duration) -> PollHandle {
        let shared = self.shared.clone();
        PollHandle(tokio::spawn(async move {
            // The session start already loaded the directory once.
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                shared.reload_directory().await;
            }
        }))
    }

    /// Read the current conversation once, outside the timer.
    pub async fn refresh_messages(&self) {
        let generation = self.shared.state.read().await.selector.generation();
        self.shared.poll_once(generation).await;
    }

    pub async fn set_text(&self, text: impl Into<String>) {
        self.shared.state.write().await.composer.text = text.into();
    }

    pub async fn attach(&self, attachment: Attachment) {
        self.shared.state.write().await.composer.attachment = Some(attachment);
    }

    pub async fn clear_attachment(&self) {
        self.shared.state.write().await.composer.attachment = None;
    }

    pub async fn composer(&self) -> Composer {
        self.shared.state.read().await.composer.clone()
    }

    /// Send the composer contents to the selected conversation.
    ///
    /// The composer is cleared only after the write succeeds. The message
    /// shows up on the next poll.
    pub async fn send(&self) -> Result<SendOutcome> {
        let (composer, from, scope) = {
            let state = self.shared.state.read().await;
            if state.composer.is_empty() {
                return Ok(SendOutcome::NothingToSend);
            }
            let scope = if state.role.is_observer() {
                ConversationTarget::Peer(state.wire_identity.clone())
            } else {
                match state.selector.current() {
                    Some(target) => target.clone(),
                    None => return Ok(SendOutcome::NoTarget),
                }
            };
            (state.composer.clone(), state.wire_identity.clone(), scope)
        };

        let body = match &composer.attachment {
            Some(attachment) => {
                let locator = self
                    .shared
                    .transport
                    .upload_attachment(attachment)
                    .await
                    .map_err(|e| {
                        warn!("[ChatClient] Attachment upload failed: {}", e);
                        e
                    })?;
                MessageBody::attachment(locator)
            }
            None => MessageBody::Text(encode(composer.text.trim())),
        };

        let outgoing = match scope {
            ConversationTarget::Peer(to) => OutgoingMessage::direct(from, to, &body),
            ConversationTarget::Group(group) => OutgoingMessage::group(from, group, &body),
        };

        if let Err(e) = self.shared.transport.send_message(&outgoing).await {
            warn!("[ChatClient] Send failed: {}", e);
            return Err(e);
        }

        let mut state = self.shared.state.write().await;
        if state.composer == composer {
            state.composer = Composer::default();
        }
        Ok(SendOutcome::Sent)
    }

    pub async fn set_hide_encrypted(&self, hide: bool) {
        self.shared.state.write().await.hide_encrypted = hide;
        self.shared.notify();
    }

    pub async fn refresh_groups(&self) {
        self.shared.refresh_groups().await;
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.shared.state.read().await.groups.clone()
    }

    /// Create a group from display names; the local user is always a member.
    pub async fn create_group(&self, name: &str, member_display_names: &[&str]) -> Result<Group> {
        let request = {
            let state = self.shared.state.read().await;
            let mut members: Vec<String> = member_display_names
                .iter()
                .map(|display| {
                    state
                        .directory
                        .find_by_display(display)
                        .map(|identity| identity.wire.clone())
                        .unwrap_or_else(|| display.to_string())
                })
                .collect();
            if !members.contains(&state.wire_identity) {
                members.insert(0, state.wire_identity.clone());
            }
            NewGroup {
                name: name.to_string(),
                members,
            }
        };

        let group = self.shared.transport.create_group(&request).await?;
        info!("[ChatClient] Created group {}", group.name);
        self.shared.refresh_groups().await;
        Ok(group)
    }

    pub async fn snapshot(&self) -> ChatView {
        let state = self.shared.state.read().await;
        let contacts = if state.role.is_observer() {
            Vec::new()
        } else {
            contacts_for(&state.directory, &state.display_name)
        };
        let selection = state.selector.current().cloned();
        let selection_label = selection.as_ref().map(|target| match target {
            ConversationTarget::Peer(wire) => state.directory.display_for(wire),
            ConversationTarget::Group(name) => format!("#{}", name),
        });

        ChatView {
            role: state.role,
            display_name: state.display_name.clone(),
            wire_identity: state.wire_identity.clone(),
            contacts,
            groups: state.groups.clone(),
            selection,
            selection_label,
            messages: state.render_context().render_all(&state.messages),
            composer_text: state.composer.text.clone(),
            pending_attachment: state.composer.attachment.as_ref().map(|a| a.filename.clone()),
            hide_encrypted: state.hide_encrypted,
        }
    }

    /// Ticks whenever the rendered view may have changed.
    pub fn on_update(&self) -> watch::Receiver<u64> {
        self.shared.updates.subscribe()
    }

    /// Stop every timer and forget the session.
    pub async fn sign_out(&self) {
        self.poll.lock().await.take();
        self.directory_task.lock().await.take();

        let mut state = self.shared.state.write().await;
        info!("[ChatClient] {} signed out", state.display_name);
        state.selector.deselect();
        state.directory = Directory::default();
        state.messages.clear();
        state.groups.clear();
        state.composer = Composer::default();
        state.wire_identity.clear();
        state.display_name.clear();
        drop(state);

        self.shared.notify();
    }

    /// True while a poll task is running.
    pub async fn is_polling(&self) -> bool {
        self.poll
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}
