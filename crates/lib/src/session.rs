//! Chat session client: channel activation, message sending and input gating.
//!
//! A [`ChatSession`] owns the current backend session id, the transcript and one
//! `Idle`/`InFlight` guard per operation class. Operations take `&self` and may be
//! called from several tasks; a second request is refused while either guard is
//! in flight. Every state change is published as a [`SessionEvent`] so a rendering
//! surface can follow along.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::broadcast;

use crate::backend::{BackendError, ChatBackend, HttpBackend};
use crate::config::{ChannelsConfig, Config};
use crate::transcript::{Category, Entry, EntryId, Sender, Transcript};

/// Opaque session identifier assigned by the backend.
pub type SessionId = String;

const EVENT_CAPACITY: usize = 256;

pub const MSG_EMPTY_CHANNEL: &str = "Please enter a channel name.";
pub const MSG_CHANNEL_NOT_ALLOWED: &str = "Please enter an allowed channel.";
pub const MSG_PROCESSING: &str = "Processing channel...";
pub const MSG_CHANNEL_READY: &str =
    "Channel processed successfully! You can now start chatting about the channel's content.";
pub const MSG_NO_RESPONSE: &str = "No response received from bot";

/// Operation classes, each with its own single-flight guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ChannelActivation,
    MessageSend,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::ChannelActivation => f.write_str("channel activation"),
            Operation::MessageSend => f.write_str("message send"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpState {
    #[default]
    Idle,
    InFlight,
}

/// Which inputs a surface should currently accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    /// Channel name input and its submit control.
    pub channel_input_enabled: bool,
    /// Message input and send control.
    pub message_input_enabled: bool,
}

/// Change notifications for rendering surfaces.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    Appended(Entry),
    Removed(EntryId),
    Controls(Controls),
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("channel name is empty")]
    EmptyChannelName,
    #[error("channel {0:?} is not in the allowed list")]
    ChannelNotAllowed(String),
    #[error("message is empty")]
    EmptyMessage,
    #[error("no active session")]
    NoSession,
    #[error("{0} already in flight")]
    Busy(Operation),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error("no response received from bot")]
    NoResponse,
}

struct State {
    session_id: Option<SessionId>,
    channel_name: Option<String>,
    activation: OpState,
    send: OpState,
    transcript: Transcript,
}

impl State {
    fn idle(&self) -> bool {
        self.activation == OpState::Idle && self.send == OpState::Idle
    }

    fn controls(&self) -> Controls {
        Controls {
            channel_input_enabled: self.idle(),
            message_input_enabled: self.idle() && self.session_id.is_some(),
        }
    }

    fn guard_mut(&mut self, op: Operation) -> &mut OpState {
        match op {
            Operation::ChannelActivation => &mut self.activation,
            Operation::MessageSend => &mut self.send,
        }
    }

    /// The operation currently holding a guard, if any.
    fn busy(&self) -> Option<Operation> {
        if self.activation == OpState::InFlight {
            Some(Operation::ChannelActivation)
        } else if self.send == OpState::InFlight {
            Some(Operation::MessageSend)
        } else {
            None
        }
    }
}

struct Inner {
    backend: Arc<dyn ChatBackend>,
    channels: ChannelsConfig,
    state: Mutex<State>,
    events: broadcast::Sender<SessionEvent>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    fn append(&self, state: &mut State, sender: Sender, text: String, category: Category) -> Entry {
        let entry = state.transcript.append(sender, text, category);
        self.emit(SessionEvent::Appended(entry.clone()));
        entry
    }

    /// Mark `op` in flight. Caller must have checked `busy()`.
    fn begin(self: &Arc<Self>, state: &mut State, op: Operation) -> Flight {
        *state.guard_mut(op) = OpState::InFlight;
        self.emit(SessionEvent::Controls(state.controls()));
        Flight {
            inner: Arc::clone(self),
            op,
            loading: None,
        }
    }
}

/// Held for the duration of a request. Dropping it (normal completion, error or
/// cancellation of the awaiting task) removes the loading entry and returns the
/// guard to `Idle`.
struct Flight {
    inner: Arc<Inner>,
    op: Operation,
    loading: Option<EntryId>,
}

impl Drop for Flight {
    fn drop(&mut self) {
        let mut state = self.inner.lock();
        if let Some(id) = self.loading.take() {
            if state.transcript.remove_loading(id) {
                self.inner.emit(SessionEvent::Removed(id));
            }
        }
        *state.guard_mut(self.op) = OpState::Idle;
        self.inner.emit(SessionEvent::Controls(state.controls()));
    }
}

/// One conversation client. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ChatSession {
    inner: Arc<Inner>,
}

impl ChatSession {
    pub fn new(backend: Arc<dyn ChatBackend>, channels: ChannelsConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                backend,
                channels,
                state: Mutex::new(State {
                    session_id: None,
                    channel_name: None,
                    activation: OpState::Idle,
                    send: OpState::Idle,
                    transcript: Transcript::new(),
                }),
                events,
            }),
        }
    }

    /// Session talking to the HTTP backend named by `config`.
    pub fn from_config(config: &Config) -> Result<Self, BackendError> {
        let backend = HttpBackend::from_config(config)?;
        log::debug!("chat backend at {}", backend.base_url());
        Ok(Self::new(Arc::new(backend), config.channels.clone()))
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Ingest a channel on the backend and make it the current session.
    ///
    /// Returns the new session id. Errors are also reported in the transcript,
    /// except [`ChatError::Busy`], which is a silent no-op.
    pub async fn activate_channel(&self, name: &str) -> Result<SessionId, ChatError> {
        let name = name.trim();
        let _flight = {
            let mut state = self.inner.lock();
            if let Some(op) = state.busy() {
                log::debug!("activate_channel ignored: {} in flight", op);
                return Err(ChatError::Busy(op));
            }
            if name.is_empty() {
                self.inner.append(
                    &mut state,
                    Sender::System,
                    MSG_EMPTY_CHANNEL.to_string(),
                    Category::Error,
                );
                return Err(ChatError::EmptyChannelName);
            }
            if !self.inner.channels.is_allowed(name) {
                self.inner.append(
                    &mut state,
                    Sender::System,
                    MSG_CHANNEL_NOT_ALLOWED.to_string(),
                    Category::Error,
                );
                return Err(ChatError::ChannelNotAllowed(name.to_string()));
            }
            let mut flight = self.inner.begin(&mut state, Operation::ChannelActivation);
            let loading = self.inner.append(
                &mut state,
                Sender::System,
                MSG_PROCESSING.to_string(),
                Category::Loading,
            );
            flight.loading = Some(loading.id);
            flight
        };

        log::info!("processing channel {:?}", name);
        let result = self.inner.backend.activate_channel(name).await;

        let mut state = self.inner.lock();
        match result {
            Ok(activated) => {
                if let Some(old) = state.session_id.replace(activated.session_id.clone()) {
                    log::info!("session {} replaced by {}", old, activated.session_id);
                }
                state.channel_name = Some(name.to_string());
                self.inner.append(
                    &mut state,
                    Sender::System,
                    MSG_CHANNEL_READY.to_string(),
                    Category::Success,
                );
                Ok(activated.session_id)
            }
            Err(e) => {
                log::warn!("processing channel {:?} failed: {}", name, e);
                self.inner.append(
                    &mut state,
                    Sender::System,
                    format!("Error processing channel: {}", e),
                    Category::Error,
                );
                Err(e.into())
            }
        }
        // `state` is released before `_flight` drops (reverse declaration order).
    }

    /// Send one chat turn in the current session.
    ///
    /// Without an active session, while another request is in flight, or with an
    /// empty message this is a no-op (no entry, no request). Otherwise the user
    /// entry is appended before the request is issued. Returns the bot reply.
    pub async fn send_message(&self, text: &str) -> Result<String, ChatError> {
        let text = text.trim();
        let (session_id, _flight) = {
            let mut state = self.inner.lock();
            let Some(session_id) = state.session_id.clone() else {
                return Err(ChatError::NoSession);
            };
            if let Some(op) = state.busy() {
                log::debug!("send_message ignored: {} in flight", op);
                return Err(ChatError::Busy(op));
            }
            if text.is_empty() {
                return Err(ChatError::EmptyMessage);
            }
            self.inner
                .append(&mut state, Sender::User, text.to_string(), Category::Normal);
            let flight = self.inner.begin(&mut state, Operation::MessageSend);
            (session_id, flight)
        };

        let result = self.inner.backend.send_message(&session_id, text).await;

        let mut state = self.inner.lock();
        match result {
            Ok(reply) => match reply.text() {
                Some(reply) => {
                    self.inner
                        .append(&mut state, Sender::Bot, reply.to_string(), Category::Normal);
                    Ok(reply.to_string())
                }
                None => {
                    log::warn!("session {}: empty reply", session_id);
                    self.inner.append(
                        &mut state,
                        Sender::System,
                        format!("Error: {}", MSG_NO_RESPONSE),
                        Category::Error,
                    );
                    Err(ChatError::NoResponse)
                }
            },
            Err(e) => {
                log::warn!("session {}: send failed: {}", session_id, e);
                self.inner.append(
                    &mut state,
                    Sender::System,
                    format!("Error: {}", e),
                    Category::Error,
                );
                Err(e.into())
            }
        }
    }

    /// Append an entry to the transcript. No network or session-state effects.
    pub fn append_entry(&self, sender: Sender, text: impl Into<String>, category: Category) -> Entry {
        let mut state = self.inner.lock();
        self.inner.append(&mut state, sender, text.into(), category)
    }

    pub fn controls(&self) -> Controls {
        self.inner.lock().controls()
    }

    pub fn state_of(&self, op: Operation) -> OpState {
        *self.inner.lock().guard_mut(op)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.inner.lock().session_id.clone()
    }

    /// Name of the channel bound to the current session.
    pub fn channel_name(&self) -> Option<String> {
        self.inner.lock().channel_name.clone()
    }

    /// Snapshot of the transcript.
    pub fn transcript(&self) -> Vec<Entry> {
        self.inner.lock().transcript.entries().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{ChannelActivated, ChatReply};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// Backend that replays scripted results and counts calls. When `gate` is set,
    /// each call waits for a notification before answering.
    #[derive(Default)]
    struct Scripted {
        channels: Mutex<VecDeque<Result<ChannelActivated, BackendError>>>,
        replies: Mutex<VecDeque<Result<ChatReply, BackendError>>>,
        channel_calls: AtomicUsize,
        chat_calls: AtomicUsize,
        seen_sessions: Mutex<Vec<String>>,
        gate: Option<Arc<Notify>>,
    }

    impl Scripted {
        fn activation(self, id: &str) -> Self {
            self.channels.lock().unwrap().push_back(Ok(ChannelActivated {
                session_id: id.to_string(),
            }));
            self
        }

        fn activation_err(self, e: BackendError) -> Self {
            self.channels.lock().unwrap().push_back(Err(e));
            self
        }

        fn reply(self, r: Option<&str>) -> Self {
            self.replies.lock().unwrap().push_back(Ok(ChatReply {
                response: r.map(str::to_string),
            }));
            self
        }

        fn reply_err(self, e: BackendError) -> Self {
            self.replies.lock().unwrap().push_back(Err(e));
            self
        }

        fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }
    }

    #[async_trait]
    impl ChatBackend for Scripted {
        async fn activate_channel(&self, _name: &str) -> Result<ChannelActivated, BackendError> {
            self.channel_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(g) = &self.gate {
                g.notified().await;
            }
            self.channels
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted activation")
        }

        async fn send_message(&self, session_id: &str, _message: &str) -> Result<ChatReply, BackendError> {
            self.chat_calls.fetch_add(1, Ordering::SeqCst);
            self.seen_sessions.lock().unwrap().push(session_id.to_string());
            if let Some(g) = &self.gate {
                g.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .expect("unscripted reply")
        }
    }

    fn session(backend: Scripted) -> (ChatSession, Arc<Scripted>) {
        let backend = Arc::new(backend);
        let s = ChatSession::new(backend.clone(), ChannelsConfig::default());
        (s, backend)
    }

    fn shape(s: &ChatSession) -> Vec<(Sender, Category, String)> {
        s.transcript()
            .into_iter()
            .map(|e| (e.sender, e.category, e.text))
            .collect()
    }

    async fn wait_for(s: &ChatSession, op: Operation) {
        for _ in 0..200 {
            if s.state_of(op) == OpState::InFlight {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{} never went in flight", op);
    }

    #[test]
    fn fresh_session_has_only_channel_input() {
        let (s, _) = session(Scripted::default());
        assert_eq!(
            s.controls(),
            Controls {
                channel_input_enabled: true,
                message_input_enabled: false
            }
        );
        assert!(s.session_id().is_none());
        assert!(s.transcript().is_empty());
    }

    #[tokio::test]
    async fn empty_channel_name_is_rejected_locally() {
        let (s, backend) = session(Scripted::default());
        let err = s.activate_channel("   ").await.unwrap_err();
        assert!(matches!(err, ChatError::EmptyChannelName));
        assert_eq!(backend.channel_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            shape(&s),
            vec![(Sender::System, Category::Error, MSG_EMPTY_CHANNEL.to_string())]
        );
        assert!(s.controls().channel_input_enabled);
    }

    #[tokio::test]
    async fn channel_outside_allow_list_is_rejected_locally() {
        let backend = Arc::new(Scripted::default());
        let s = ChatSession::new(
            backend.clone(),
            ChannelsConfig {
                allowed: vec!["NJFamilyChurch".to_string()],
            },
        );
        let err = s.activate_channel("other").await.unwrap_err();
        assert!(matches!(err, ChatError::ChannelNotAllowed(_)));
        assert_eq!(backend.channel_calls.load(Ordering::SeqCst), 0);
        assert_eq!(s.transcript()[0].text, MSG_CHANNEL_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn activate_then_chat() {
        let (s, backend) = session(Scripted::default().activation("s1").reply(Some("hi there")));

        assert_eq!(s.activate_channel(" demo ").await.unwrap(), "s1");
        assert_eq!(s.session_id().as_deref(), Some("s1"));
        assert_eq!(s.channel_name().as_deref(), Some("demo"));
        assert!(s.controls().message_input_enabled);

        assert_eq!(s.send_message("hello").await.unwrap(), "hi there");
        assert_eq!(
            shape(&s),
            vec![
                (Sender::System, Category::Success, MSG_CHANNEL_READY.to_string()),
                (Sender::User, Category::Normal, "hello".to_string()),
                (Sender::Bot, Category::Normal, "hi there".to_string()),
            ]
        );
        assert_eq!(*backend.seen_sessions.lock().unwrap(), vec!["s1".to_string()]);
        assert!(s.controls().message_input_enabled);
        assert!(s.controls().channel_input_enabled);
    }

    #[tokio::test]
    async fn activation_failure_reports_server_detail() {
        let (s, _) = session(
            Scripted::default().activation_err(BackendError::api(500, Some("bad channel".to_string()))),
        );
        let err = s.activate_channel("demo").await.unwrap_err();
        assert!(matches!(err, ChatError::Backend(BackendError::Api { status: 500, .. })));

        let entries = s.transcript();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].category, Category::Error);
        assert!(entries[0].text.contains("bad channel"));
        assert_eq!(
            s.controls(),
            Controls {
                channel_input_enabled: true,
                message_input_enabled: false
            }
        );
        assert!(s.session_id().is_none());
    }

    #[tokio::test]
    async fn activation_failure_keeps_previous_session() {
        let (s, _) = session(
            Scripted::default()
                .activation("s1")
                .activation_err(BackendError::api(503, None)),
        );
        s.activate_channel("demo").await.unwrap();
        s.activate_channel("other").await.unwrap_err();
        assert_eq!(s.session_id().as_deref(), Some("s1"));
        assert_eq!(s.channel_name().as_deref(), Some("demo"));
        assert!(s.controls().message_input_enabled);
        assert_eq!(
            s.transcript().last().map(|e| e.text.clone()).unwrap(),
            "Error processing channel: HTTP error! status: 503"
        );
    }

    #[tokio::test]
    async fn new_channel_replaces_session() {
        let (s, backend) = session(
            Scripted::default()
                .activation("s1")
                .activation("s2")
                .reply(Some("ok")),
        );
        s.activate_channel("one").await.unwrap();
        s.activate_channel("two").await.unwrap();
        s.send_message("hi").await.unwrap();
        assert_eq!(*backend.seen_sessions.lock().unwrap(), vec!["s2".to_string()]);
    }

    #[tokio::test]
    async fn send_without_session_is_noop() {
        let (s, backend) = session(Scripted::default());
        let err = s.send_message("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::NoSession));
        assert!(s.transcript().is_empty());
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
        assert!(!s.controls().message_input_enabled);
    }

    #[tokio::test]
    async fn empty_message_is_noop() {
        let (s, backend) = session(Scripted::default().activation("s1"));
        s.activate_channel("demo").await.unwrap();
        let before = s.transcript().len();
        assert!(matches!(s.send_message("  ").await, Err(ChatError::EmptyMessage)));
        assert_eq!(s.transcript().len(), before);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn empty_reply_is_reported() {
        let (s, _) = session(Scripted::default().activation("s1").reply(Some("")));
        s.activate_channel("demo").await.unwrap();
        assert!(matches!(s.send_message("hello").await, Err(ChatError::NoResponse)));
        let last = s.transcript().last().cloned().unwrap();
        assert_eq!(last.sender, Sender::System);
        assert_eq!(last.category, Category::Error);
        assert_eq!(last.text, "Error: No response received from bot");
        assert!(s.controls().message_input_enabled);
    }

    #[tokio::test]
    async fn send_failure_is_reported_and_input_reenabled() {
        let (s, _) = session(
            Scripted::default()
                .activation("s1")
                .reply_err(BackendError::api(404, Some("Session not found".to_string()))),
        );
        s.activate_channel("demo").await.unwrap();
        s.send_message("hello").await.unwrap_err();
        let texts: Vec<_> = s.transcript().into_iter().map(|e| e.text).collect();
        assert_eq!(texts[1], "hello");
        assert_eq!(texts[2], "Error: Session not found");
        assert!(s.controls().message_input_enabled);
    }

    #[tokio::test]
    async fn second_activation_while_in_flight_is_noop() {
        let gate = Arc::new(Notify::new());
        let (s, backend) = session(Scripted::default().activation("s1").gated(gate.clone()));

        let first = tokio::spawn({
            let s = s.clone();
            async move { s.activate_channel("demo").await }
        });
        wait_for(&s, Operation::ChannelActivation).await;

        assert_eq!(
            s.controls(),
            Controls {
                channel_input_enabled: false,
                message_input_enabled: false
            }
        );
        assert_eq!(s.transcript()[0].category, Category::Loading);
        assert!(matches!(
            s.activate_channel("demo").await,
            Err(ChatError::Busy(Operation::ChannelActivation))
        ));

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), "s1");
        assert_eq!(backend.channel_calls.load(Ordering::SeqCst), 1);
        assert!(s.transcript().iter().all(|e| e.category != Category::Loading));
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_noop() {
        let gate = Arc::new(Notify::new());
        let (s, backend) = session(
            Scripted::default()
                .activation("s1")
                .reply(Some("first"))
                .gated(gate.clone()),
        );
        let activating = tokio::spawn({
            let s = s.clone();
            async move { s.activate_channel("demo").await }
        });
        wait_for(&s, Operation::ChannelActivation).await;
        gate.notify_one();
        activating.await.unwrap().unwrap();

        let sending = tokio::spawn({
            let s = s.clone();
            async move { s.send_message("one").await }
        });
        wait_for(&s, Operation::MessageSend).await;
        assert!(!s.controls().message_input_enabled);
        let before = s.transcript().len();
        assert!(matches!(
            s.send_message("two").await,
            Err(ChatError::Busy(Operation::MessageSend))
        ));
        // Channel activation is also refused while a send is in flight.
        assert!(matches!(
            s.activate_channel("other").await,
            Err(ChatError::Busy(Operation::MessageSend))
        ));
        assert_eq!(s.transcript().len(), before);

        gate.notify_one();
        assert_eq!(sending.await.unwrap().unwrap(), "first");
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 1);
        assert!(s.controls().message_input_enabled);
    }

    #[tokio::test]
    async fn send_while_reactivating_is_noop() {
        let gate = Arc::new(Notify::new());
        let (s, backend) = session(
            Scripted::default()
                .activation("s1")
                .activation("s2")
                .gated(gate.clone()),
        );
        let first = tokio::spawn({
            let s = s.clone();
            async move { s.activate_channel("demo").await }
        });
        wait_for(&s, Operation::ChannelActivation).await;
        gate.notify_one();
        first.await.unwrap().unwrap();
        assert!(s.controls().message_input_enabled);

        let second = tokio::spawn({
            let s = s.clone();
            async move { s.activate_channel("other").await }
        });
        wait_for(&s, Operation::ChannelActivation).await;
        let before = shape(&s);
        assert!(matches!(
            s.send_message("hello").await,
            Err(ChatError::Busy(Operation::ChannelActivation))
        ));
        assert_eq!(shape(&s), before);
        assert_eq!(backend.chat_calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            s.controls(),
            Controls {
                channel_input_enabled: false,
                message_input_enabled: false
            }
        );

        gate.notify_one();
        assert_eq!(second.await.unwrap().unwrap(), "s2");
        assert_eq!(s.session_id().as_deref(), Some("s2"));
        assert!(s.controls().message_input_enabled);
    }

    #[tokio::test]
    async fn cancelled_activation_releases_guard() {
        let gate = Arc::new(Notify::new());
        let (s, _) = session(Scripted::default().activation("s1").gated(gate));
        let task = tokio::spawn({
            let s = s.clone();
            async move { s.activate_channel("demo").await }
        });
        wait_for(&s, Operation::ChannelActivation).await;
        task.abort();
        let _ = task.await;
        assert_eq!(s.state_of(Operation::ChannelActivation), OpState::Idle);
        assert!(s.transcript().is_empty());
        assert!(s.controls().channel_input_enabled);
    }

    #[tokio::test]
    async fn events_follow_the_transcript() {
        let (s, _) = session(Scripted::default().activation("s1"));
        let mut rx = s.subscribe();
        s.activate_channel("demo").await.unwrap();

        let mut events = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            events.push(ev);
        }
        let loading_id = match &events[1] {
            SessionEvent::Appended(e) if e.category == Category::Loading => e.id,
            other => panic!("expected loading entry, got {:?}", other),
        };
        assert!(matches!(events[0], SessionEvent::Controls(c) if !c.channel_input_enabled));
        assert!(matches!(&events[2], SessionEvent::Appended(e) if e.category == Category::Success));
        assert!(matches!(events[3], SessionEvent::Removed(id) if id == loading_id));
        assert!(matches!(
            events[4],
            SessionEvent::Controls(Controls {
                channel_input_enabled: true,
                message_input_enabled: true
            })
        ));
    }

    #[test]
    fn append_entry_has_no_session_effects() {
        let (s, _) = session(Scripted::default());
        let e = s.append_entry(Sender::System, "note", Category::Normal);
        assert_eq!(s.transcript()[0].id, e.id);
        assert!(s.session_id().is_none());
        assert!(s.controls().channel_input_enabled);
    }
}
