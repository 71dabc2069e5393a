//! The Oracle application core: session lifecycle, dispatch, and the
//! streaming append of model replies.
//!
//! [`OracleApp`] owns the observable state pair, the [`Conversation`] and
//! the [`RequestState`], and is the only thing that mutates either. All
//! mutation happens on one logical thread of control: the busy flag is
//! checked and set before the first suspension point of a dispatch, so a
//! second dispatch can never interleave with an active stream and the
//! trailing placeholder is always the stream's target.

use crate::llm::gateway::LlmGateway;
use crate::llm::gateways::{GeminiConfig, GeminiGateway};
use crate::llm::session::ChatSession;
use crate::oracle::conversation::{Conversation, Message};
use crate::oracle::observer::{ChatObserver, NullObserver};
use crate::oracle::prompts;
use futures::stream::StreamExt;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Single-flight discipline for the outbound chat request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Busy,
}

/// Configuration for the Oracle application
#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_key: String,
    pub model: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("GEMINI_API_KEY").unwrap_or_default(),
            model: std::env::var("ORACLE_MODEL")
                .unwrap_or_else(|_| prompts::DEFAULT_MODEL.to_string()),
        }
    }
}

/// The conversational state machine behind the chat view.
pub struct OracleApp {
    session: Option<ChatSession>,
    conversation: Conversation,
    request_state: RequestState,
    observer: Box<dyn ChatObserver>,
}

impl OracleApp {
    /// Create an app with no observer attached.
    pub fn new() -> Self {
        Self::with_observer(Box::new(NullObserver))
    }

    /// Create an app whose observer is notified after every change.
    pub fn with_observer(observer: Box<dyn ChatObserver>) -> Self {
        Self {
            session: None,
            conversation: Conversation::new(),
            request_state: RequestState::Idle,
            observer,
        }
    }

    /// The conversation in display order
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Whether a request is currently in flight
    pub fn request_state(&self) -> RequestState {
        self.request_state
    }

    /// Whether initialization produced a usable session
    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    /// One-time session setup against the hosted Gemini service.
    ///
    /// On success the conversation gains the Oracle's greeting; on any
    /// failure (missing credential, connectivity, backend rejection) it
    /// gains the apology notice instead and the session stays unset, which
    /// makes every later dispatch a no-op. A second call is a no-op: the
    /// session is bound once per application lifetime.
    pub async fn initialize(&mut self, config: OracleConfig) {
        if !self.conversation.is_empty() {
            return;
        }

        if config.api_key.trim().is_empty() {
            error!("Failed to initialize the Oracle: no API credential configured");
            self.conversation.push(Message::model(prompts::INIT_FAILURE_NOTICE));
            self.notify();
            return;
        }

        let gateway = Arc::new(GeminiGateway::with_config(GeminiConfig {
            api_key: config.api_key,
            ..Default::default()
        }));

        self.initialize_with_gateway(gateway, &config.model).await;
    }

    /// Session setup against an explicit gateway.
    ///
    /// The gateway is probed with `list_models` so that a bad credential or
    /// an unreachable endpoint surfaces here, once, instead of on the first
    /// question.
    pub async fn initialize_with_gateway(&mut self, gateway: Arc<dyn LlmGateway>, model: &str) {
        if !self.conversation.is_empty() {
            return;
        }

        match gateway.list_models().await {
            Ok(models) => {
                info!("Oracle session established, {} models visible", models.len());
                let session = ChatSession::builder(model, gateway)
                    .system_instruction(prompts::system_instruction())
                    .build();
                self.session = Some(session);
                self.conversation.push(Message::model(prompts::GREETING));
            }
            Err(e) => {
                error!("Failed to initialize the Oracle: {}", e);
                self.conversation.push(Message::model(prompts::INIT_FAILURE_NOTICE));
            }
        }

        self.notify();
    }

    /// Send a user question and stream the Oracle's reply into the
    /// conversation.
    ///
    /// The call is a silent no-op unless the trimmed input is non-empty, no
    /// request is in flight, and a session exists. An accepted dispatch
    /// appends the user message and an empty model placeholder before any
    /// network activity, then rewrites the placeholder as fragments arrive.
    /// Whatever the outcome, the request state returns to idle.
    pub async fn dispatch(&mut self, input: &str) {
        let query = input.trim();
        if query.is_empty()
            || self.request_state == RequestState::Busy
            || self.session.is_none()
        {
            return;
        }

        // Claimed before the first await, so no second dispatch can slip in
        self.request_state = RequestState::Busy;
        self.conversation.push(Message::user(query));
        self.conversation.push(Message::model(""));
        self.notify();

        self.stream_reply(query).await;

        self.request_state = RequestState::Idle;
        self.notify();
    }

    /// Drive one streamed reply into the trailing placeholder.
    ///
    /// Each fragment extends an accumulator whose current value replaces the
    /// last message's text wholesale; earlier messages are never touched. A
    /// stream error discards the partial accumulation in favour of the fixed
    /// disturbance notice.
    async fn stream_reply(&mut self, query: &str) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let mut accumulated = String::new();
        let mut stream = session.send_stream(query);

        while let Some(result) = stream.next().await {
            match result {
                Ok(fragment) => {
                    accumulated.push_str(&fragment);
                    self.conversation.set_last_text(accumulated.clone());
                    self.observer.on_change(&self.conversation, RequestState::Busy);
                }
                Err(e) => {
                    warn!("Error while streaming the Oracle's reply: {}", e);
                    self.conversation.set_last_text(prompts::STREAM_FAILURE_NOTICE);
                    self.observer.on_change(&self.conversation, RequestState::Busy);
                    return;
                }
            }
        }
    }

    fn notify(&self) {
        self.observer.on_change(&self.conversation, self.request_state);
    }
}

impl Default for OracleApp {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{OracleError, Result};
    use crate::llm::gateway::GenerationConfig;
    use crate::llm::models::LlmMessage;
    use crate::oracle::conversation::Role;
    use futures::stream::{self, Stream};
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Copy)]
    enum MockFragment {
        Text(&'static str),
        Fail,
    }

    // Gateway scripted with one fragment list per stream_chat call
    struct MockGateway {
        scripts: Vec<Vec<MockFragment>>,
        call_count: Mutex<usize>,
        fail_listing: bool,
    }

    impl MockGateway {
        fn new(scripts: Vec<Vec<MockFragment>>) -> Self {
            Self {
                scripts,
                call_count: Mutex::new(0),
                fail_listing: false,
            }
        }

        fn unreachable_backend() -> Self {
            Self {
                scripts: vec![],
                call_count: Mutex::new(0),
                fail_listing: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl LlmGateway for MockGateway {
        async fn list_models(&self) -> Result<Vec<String>> {
            if self.fail_listing {
                Err(OracleError::GatewayError("no connection".to_string()))
            } else {
                Ok(vec!["gemini-test".to_string()])
            }
        }

        fn stream_chat<'a>(
            &'a self,
            _model: &'a str,
            _system_instruction: &'a str,
            _messages: &'a [LlmMessage],
            _config: &'a GenerationConfig,
        ) -> Pin<Box<dyn Stream<Item = Result<String>> + Send + 'a>> {
            let mut count = self.call_count.lock().unwrap();
            let idx = *count;
            *count += 1;

            let script = self.scripts.get(idx).cloned().unwrap_or_default();
            let items: Vec<Result<String>> = script
                .into_iter()
                .map(|f| match f {
                    MockFragment::Text(t) => Ok(t.to_string()),
                    MockFragment::Fail => {
                        Err(OracleError::GatewayError("stream interrupted".to_string()))
                    }
                })
                .collect();

            Box::pin(stream::iter(items))
        }
    }

    async fn app_with_scripts(scripts: Vec<Vec<MockFragment>>) -> OracleApp {
        let mut app = OracleApp::new();
        let gateway = Arc::new(MockGateway::new(scripts));
        app.initialize_with_gateway(gateway, "gemini-test").await;
        app
    }

    #[tokio::test]
    async fn test_initialize_success_appends_greeting() {
        let app = app_with_scripts(vec![]).await;

        assert!(app.has_session());
        assert_eq!(app.request_state(), RequestState::Idle);
        assert_eq!(app.conversation().len(), 1);

        let greeting = &app.conversation().messages()[0];
        assert_eq!(greeting.role, Role::Model);
        assert_eq!(greeting.text, prompts::GREETING);
    }

    #[tokio::test]
    async fn test_initialize_failure_appends_apology() {
        let mut app = OracleApp::new();
        let gateway = Arc::new(MockGateway::unreachable_backend());
        app.initialize_with_gateway(gateway, "gemini-test").await;

        assert!(!app.has_session());
        assert_eq!(app.conversation().len(), 1);

        let apology = &app.conversation().messages()[0];
        assert_eq!(apology.role, Role::Model);
        assert_eq!(apology.text, prompts::INIT_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_initialize_without_credential_appends_apology() {
        let mut app = OracleApp::new();
        let config = OracleConfig {
            api_key: "  ".to_string(),
            model: "gemini-test".to_string(),
        };

        app.initialize(config).await;

        assert!(!app.has_session());
        assert_eq!(app.conversation().len(), 1);
        assert_eq!(app.conversation().messages()[0].text, prompts::INIT_FAILURE_NOTICE);
    }

    #[tokio::test]
    async fn test_initialize_runs_once() {
        let mut app = app_with_scripts(vec![]).await;

        let gateway = Arc::new(MockGateway::new(vec![]));
        app.initialize_with_gateway(gateway, "gemini-test").await;

        // Still just the greeting
        assert_eq!(app.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_after_failed_initialize_is_noop() {
        let mut app = OracleApp::new();
        let gateway = Arc::new(MockGateway::unreachable_backend());
        app.initialize_with_gateway(gateway, "gemini-test").await;

        app.dispatch("Is anyone there?").await;
        app.dispatch("Hello?").await;

        assert_eq!(app.conversation().len(), 1);
        assert_eq!(app.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_dispatch_streams_reply_into_placeholder() {
        let mut app = app_with_scripts(vec![vec![
            MockFragment::Text("The spirits "),
            MockFragment::Text("speak "),
            MockFragment::Text("softly."),
        ]])
        .await;

        app.dispatch("What do the spirits say?").await;

        let messages = app.conversation().messages();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[1].text, "What do the spirits say?");
        assert_eq!(messages[2].role, Role::Model);
        assert_eq!(messages[2].text, "The spirits speak softly.");
        assert_eq!(app.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_dispatch_trims_input() {
        let mut app = app_with_scripts(vec![vec![MockFragment::Text("Answer")]]).await;

        app.dispatch("  padded question  ").await;

        assert_eq!(app.conversation().messages()[1].text, "padded question");
    }

    #[tokio::test]
    async fn test_dispatch_empty_input_is_noop() {
        let mut app = app_with_scripts(vec![]).await;

        app.dispatch("").await;
        app.dispatch("   ").await;
        app.dispatch("\t\n").await;

        assert_eq!(app.conversation().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_while_busy_is_noop() {
        let mut app = app_with_scripts(vec![]).await;
        app.request_state = RequestState::Busy;

        app.dispatch("ignored while busy").await;

        assert_eq!(app.conversation().len(), 1);
        assert_eq!(app.request_state(), RequestState::Busy);
    }

    #[tokio::test]
    async fn test_dispatch_without_session_is_noop() {
        let mut app = OracleApp::new();

        app.dispatch("no session yet").await;

        assert!(app.conversation().is_empty());
        assert_eq!(app.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_earlier_messages_survive_streaming_unchanged() {
        let mut app = app_with_scripts(vec![
            vec![MockFragment::Text("First answer")],
            vec![MockFragment::Text("Second answer")],
        ])
        .await;

        app.dispatch("First question").await;
        let before: Vec<Message> = app.conversation().messages()[..3].to_vec();

        app.dispatch("Second question").await;

        assert_eq!(app.conversation().len(), 5);
        assert_eq!(&app.conversation().messages()[..3], &before[..]);
        assert_eq!(app.conversation().messages()[4].text, "Second answer");
    }

    #[tokio::test]
    async fn test_stream_failure_replaces_partial_with_notice() {
        let mut app = app_with_scripts(vec![vec![
            MockFragment::Text("A half-formed "),
            MockFragment::Text("vision "),
            MockFragment::Fail,
        ]])
        .await;

        app.dispatch("Show me a vision").await;

        let last = app.conversation().last().unwrap();
        assert_eq!(last.role, Role::Model);
        assert_eq!(last.text, prompts::STREAM_FAILURE_NOTICE);
        assert_eq!(app.request_state(), RequestState::Idle);
    }

    #[tokio::test]
    async fn test_stream_failure_before_any_fragment() {
        let mut app = app_with_scripts(vec![vec![MockFragment::Fail]]).await;

        app.dispatch("Doomed question").await;

        assert_eq!(app.conversation().len(), 3);
        assert_eq!(
            app.conversation().last().unwrap().text,
            prompts::STREAM_FAILURE_NOTICE
        );
    }

    #[tokio::test]
    async fn test_dispatch_recovers_after_stream_failure() {
        let mut app = app_with_scripts(vec![
            vec![MockFragment::Fail],
            vec![MockFragment::Text("Recovered answer")],
        ])
        .await;

        app.dispatch("First try").await;
        app.dispatch("Second try").await;

        assert_eq!(app.conversation().len(), 5);
        assert_eq!(app.conversation().last().unwrap().text, "Recovered answer");
        assert_eq!(app.request_state(), RequestState::Idle);
    }

    // Observer capturing every notification for later inspection
    #[derive(Clone)]
    struct RecordingObserver {
        log: Arc<Mutex<Vec<(Vec<Message>, RequestState)>>>,
    }

    impl RecordingObserver {
        fn new() -> Self {
            Self {
                log: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn snapshots(&self) -> Vec<(Vec<Message>, RequestState)> {
            self.log.lock().unwrap().clone()
        }
    }

    impl ChatObserver for RecordingObserver {
        fn on_change(&self, conversation: &Conversation, state: RequestState) {
            self.log
                .lock()
                .unwrap()
                .push((conversation.messages().to_vec(), state));
        }
    }

    #[tokio::test]
    async fn test_placeholder_appended_before_first_fragment() {
        let recorder = RecordingObserver::new();
        let mut app = OracleApp::with_observer(Box::new(recorder.clone()));
        let gateway = Arc::new(MockGateway::new(vec![vec![MockFragment::Text("Reply")]]));
        app.initialize_with_gateway(gateway, "gemini-test").await;

        app.dispatch("A question").await;

        let snapshots = recorder.snapshots();
        // init greeting, dispatch bookkeeping, one fragment, idle transition
        assert_eq!(snapshots.len(), 4);

        // The dispatch notification precedes any fragment: user message plus
        // empty placeholder, already busy
        let (messages, state) = &snapshots[1];
        assert_eq!(*state, RequestState::Busy);
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, Role::User);
        assert_eq!(messages[2].role, Role::Model);
        assert_eq!(messages[2].text, "");
    }

    #[tokio::test]
    async fn test_observer_sees_incremental_overwrites() {
        let recorder = RecordingObserver::new();
        let mut app = OracleApp::with_observer(Box::new(recorder.clone()));
        let gateway = Arc::new(MockGateway::new(vec![vec![
            MockFragment::Text("The "),
            MockFragment::Text("spirits "),
            MockFragment::Text("whisper."),
        ]]));
        app.initialize_with_gateway(gateway, "gemini-test").await;

        app.dispatch("Listen").await;

        let snapshots = recorder.snapshots();
        let streamed: Vec<String> = snapshots[2..5]
            .iter()
            .map(|(messages, _)| messages.last().unwrap().text.clone())
            .collect();

        assert_eq!(streamed, vec!["The ", "The spirits ", "The spirits whisper."]);

        // Final notification is the idle transition with the full reply
        let (messages, state) = snapshots.last().unwrap();
        assert_eq!(*state, RequestState::Idle);
        assert_eq!(messages.last().unwrap().text, "The spirits whisper.");
    }

    #[tokio::test]
    async fn test_session_history_tracks_turns() {
        let mut app = app_with_scripts(vec![vec![MockFragment::Text("An answer")]]).await;

        app.dispatch("A question").await;

        let session = app.session.as_ref().unwrap();
        assert_eq!(session.history().len(), 2);
        assert_eq!(session.history()[0].text, "A question");
        assert_eq!(session.history()[1].text, "An answer");
    }
}
