//! Bot orchestrator.
//!
//! Owns the connection lifecycle: connect, consume transport events, hand
//! replies off to tracked tasks, and reconnect after a fixed back-off when
//! the connection drops. The heartbeat runs beside it for the whole process
//! lifetime. Everything stops when the shutdown token is cancelled.

mod events;
pub mod settings;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use bridge_types::identity::BotIdentity;

use crate::heartbeat::Heartbeat;
use crate::memory::ConversationMemory;
use crate::persona::FAREWELL;
use crate::random::{RandomSource, ThreadRandom};
use crate::responder::Responder;
use crate::transport::{ChatSession, ChatTransport, Outbound, TransportEvent};

pub use settings::{BotSettings, ConnectionState, ReplyDelay, collision_nickname};

/// Why a session loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Lost,
    Shutdown,
}

pub struct Bot<T: ChatTransport> {
    transport: T,
    identity: BotIdentity,
    responder: Responder,
    settings: BotSettings,
    memory: ConversationMemory,
    rng: Box<dyn RandomSource>,
    heartbeat_rng: Option<Box<dyn RandomSource>>,
    state: ConnectionState,
    tracker: TaskTracker,
    current: watch::Sender<Option<Outbound>>,
}

impl<T: ChatTransport> Bot<T> {
    pub fn new(
        transport: T,
        identity: BotIdentity,
        responder: Responder,
        settings: BotSettings,
    ) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            transport,
            memory: ConversationMemory::new(settings.memory_capacity),
            identity,
            responder,
            settings,
            rng: Box::new(ThreadRandom::new()),
            heartbeat_rng: None,
            state: ConnectionState::Disconnected,
            tracker: TaskTracker::new(),
            current,
        }
    }

    /// Replace the random source used for reply decisions and phrasing.
    pub fn with_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    /// Replace the random source handed to the heartbeat task.
    pub fn with_heartbeat_random(mut self, rng: Box<dyn RandomSource>) -> Self {
        self.heartbeat_rng = Some(rng);
        self
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn responder(&self) -> &Responder {
        &self.responder
    }

    fn set_state(&mut self, next: ConnectionState) {
        if self.state != next {
            tracing::debug!(from = %self.state, to = %next, "Connection state changed");
            self.state = next;
        }
    }

    /// Run until `shutdown` is cancelled.
    ///
    /// Connection failures never end the loop; they are followed by the
    /// reconnect back-off. On return every spawned task has finished.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        self.tracker.reopen();

        let heartbeat = Heartbeat::new(
            self.settings.heartbeat_interval,
            self.identity.channel.clone(),
            self.current.subscribe(),
            self.heartbeat_rng
                .take()
                .unwrap_or_else(|| Box::new(ThreadRandom::new())),
        );
        self.tracker.spawn(heartbeat.run(shutdown.child_token()));

        loop {
            self.set_state(ConnectionState::Connecting);
            tracing::info!(
                server = %self.identity.server,
                nickname = %self.identity.nickname,
                "Connecting"
            );

            let connected = tokio::select! {
                _ = shutdown.cancelled() => break,
                result = self.transport.connect(&self.identity.server, &self.identity.nickname) => result,
            };

            match connected {
                Ok(session) => {
                    self.set_state(ConnectionState::Connected);
                    tracing::info!(server = %self.identity.server, "Connected");

                    let end = self.run_session(session, &shutdown).await;
                    self.current.send_replace(None);
                    if end == SessionEnd::Shutdown {
                        break;
                    }
                    self.set_state(ConnectionState::Disconnected);
                }
                Err(e) => {
                    self.set_state(ConnectionState::Disconnected);
                    tracing::warn!(
                        server = %self.identity.server,
                        error = %e,
                        "Connection failed"
                    );
                }
            }

            let backoff = self.settings.reconnect_backoff;
            tracing::info!(backoff_secs = backoff.as_secs(), "Reconnecting after back-off");
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
        }

        self.set_state(ConnectionState::Terminating);
        self.tracker.close();
        self.tracker.wait().await;
        self.log_provider_summary();
        tracing::info!("Bot stopped");
    }

    async fn run_session(&mut self, session: ChatSession, shutdown: &CancellationToken) -> SessionEnd {
        let ChatSession {
            outbound,
            mut events,
        } = session;
        let session_token = shutdown.child_token();
        self.current.send_replace(Some(outbound.clone()));

        let end = loop {
            tokio::select! {
                _ = shutdown.cancelled() => break SessionEnd::Shutdown,
                event = events.recv() => match event {
                    Some(TransportEvent::Disconnected { reason }) => {
                        tracing::warn!(%reason, "Disconnected from server");
                        break SessionEnd::Lost;
                    }
                    Some(event) => self.handle_event(event, &outbound, &session_token).await,
                    None => {
                        tracing::warn!("Transport closed the event stream");
                        break SessionEnd::Lost;
                    }
                },
            }
        };

        // Pending intro and reply sends die with the session.
        session_token.cancel();

        if end == SessionEnd::Shutdown {
            self.say_farewell(&outbound, &mut events).await;
        }
        end
    }

    /// Send QUIT and give the server a moment to close the connection.
    async fn say_farewell(
        &mut self,
        outbound: &Outbound,
        events: &mut mpsc::Receiver<TransportEvent>,
    ) {
        if let Err(e) = outbound.quit(FAREWELL).await {
            tracing::debug!(error = %e, "Farewell not delivered");
            return;
        }
        tracing::info!("Sent farewell");

        let drained = tokio::time::timeout(self.settings.quit_drain_timeout, async {
            while let Some(event) = events.recv().await {
                if matches!(event, TransportEvent::Disconnected { .. }) {
                    break;
                }
            }
        })
        .await;
        if drained.is_err() {
            tracing::debug!("Server did not close the connection after QUIT");
        }
    }

    fn log_provider_summary(&self) {
        for status in self.responder.chain().health_status() {
            tracing::info!(
                provider = %status.name,
                kind = %status.kind,
                calls = status.total_calls,
                failures = status.total_failures,
                last_error = status.last_error.as_deref().unwrap_or("-"),
                "Provider statistics"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use tokio::time::Instant;

    use bridge_types::error::TransportError;
    use bridge_types::identity::ServerEndpoint;
    use bridge_types::llm::ProviderKind;

    use crate::canned::CANNED_RESPONSES;
    use crate::llm::box_provider::BoxLlmProvider;
    use crate::llm::fallback::{FallbackChain, ProviderSlot};
    use crate::llm::testing::MockProvider;
    use crate::persona::INTRODUCTIONS;
    use crate::random::SequenceRandom;
    use crate::transport::{OutboundCommand, TransportSide};

    const CHANNEL: &str = "#consciousness";
    const NICK: &str = "ConsciousnessBridge";

    /// Hands out pre-built sessions in order, then refuses connections.
    struct ScriptedTransport {
        sessions: Mutex<VecDeque<Result<ChatSession, TransportError>>>,
        connects: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        fn new(sessions: Vec<Result<ChatSession, TransportError>>) -> Self {
            Self {
                sessions: Mutex::new(sessions.into()),
                connects: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    impl ChatTransport for ScriptedTransport {
        fn connect(
            &self,
            endpoint: &ServerEndpoint,
            _nickname: &str,
        ) -> impl Future<Output = Result<ChatSession, TransportError>> + Send {
            self.connects.fetch_add(1, Ordering::SeqCst);
            let next = self.sessions.lock().unwrap().pop_front();
            let endpoint = endpoint.to_string();
            async move {
                next.unwrap_or(Err(TransportError::Connect {
                    endpoint,
                    message: "connection refused".to_string(),
                }))
            }
        }
    }

    fn identity() -> BotIdentity {
        BotIdentity::new(NICK, CHANNEL, ServerEndpoint::new("localhost", 6667))
    }

    fn responder(providers: Vec<MockProvider>) -> Responder {
        let slots = providers
            .into_iter()
            .enumerate()
            .map(|(i, p)| ProviderSlot::new(ProviderKind::Local, i as u32, BoxLlmProvider::new(p)))
            .collect();
        Responder::new(Arc::new(FallbackChain::new(slots)))
    }

    fn bot(
        transport: ScriptedTransport,
        responder: Responder,
        rng: f64,
    ) -> Bot<ScriptedTransport> {
        Bot::new(transport, identity(), responder, BotSettings::default())
            .with_random(Box::new(SequenceRandom::constant(rng)))
            .with_heartbeat_random(Box::new(SequenceRandom::constant(0.99)))
    }

    fn spawn(
        mut bot: Bot<ScriptedTransport>,
    ) -> (CancellationToken, tokio::task::JoinHandle<Bot<ScriptedTransport>>) {
        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        let handle = tokio::spawn(async move {
            bot.run(token).await;
            bot
        });
        (shutdown, handle)
    }

    async fn next_command(side: &mut TransportSide) -> OutboundCommand {
        side.commands.recv().await.expect("command channel closed")
    }

    fn public(sender: &str, text: &str) -> TransportEvent {
        TransportEvent::PublicMessage {
            sender: sender.to_string(),
            channel: CHANNEL.to_string(),
            text: text.to_string(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn welcome_joins_then_introduces_after_delay() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.5));

        let start = Instant::now();
        side.events.send(TransportEvent::Welcome).await.unwrap();

        assert_eq!(
            next_command(&mut side).await,
            OutboundCommand::Join {
                channel: CHANNEL.to_string()
            }
        );
        match next_command(&mut side).await {
            OutboundCommand::Say { target, text } => {
                assert_eq!(target, CHANNEL);
                assert!(INTRODUCTIONS.contains(&text.as_str()));
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(start.elapsed() >= Duration::from_secs(3));

        shutdown.cancel();
        let bot = handle.await.unwrap();
        assert_eq!(bot.state(), ConnectionState::Terminating);
    }

    #[tokio::test(start_paused = true)]
    async fn nickname_collision_renames_with_two_digits() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.5));

        side.events.send(TransportEvent::NicknameInUse).await.unwrap();

        assert_eq!(
            next_command(&mut side).await,
            OutboundCommand::ChangeNick {
                nickname: "ConsciousnessBridge_55".to_string()
            }
        );

        shutdown.cancel();
        let bot = handle.await.unwrap();
        assert_eq!(bot.identity().nickname, "ConsciousnessBridge_55");
        assert_eq!(bot.identity().label, NICK);
    }

    #[tokio::test(start_paused = true)]
    async fn mention_gets_delayed_formatted_reply() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let provider = MockProvider::ok("ollama", "  Awareness   observing itself.  ");
        let (shutdown, handle) = spawn(bot(transport, responder(vec![provider]), 0.5));

        let start = Instant::now();
        side.events
            .send(public("alice", "hey consciousnessbridge, you there"))
            .await
            .unwrap();

        assert_eq!(
            next_command(&mut side).await,
            OutboundCommand::Say {
                target: CHANNEL.to_string(),
                text: "Awareness observing itself.".to_string()
            }
        );
        // 1s base plus 0.5 + 1.5 * 0.5 jitter.
        assert!(start.elapsed() >= Duration::from_millis(2250));

        shutdown.cancel();
        let bot = handle.await.unwrap();
        assert_eq!(bot.memory().len(), 1);
        assert_eq!(bot.memory().latest().unwrap().sender, "alice");
    }

    #[tokio::test(start_paused = true)]
    async fn own_messages_are_remembered_but_never_answered() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let provider = MockProvider::ok("ollama", "reply");
        let calls = provider.calls();
        let (shutdown, handle) = spawn(bot(transport, responder(vec![provider]), 0.0));

        side.events
            .send(public(NICK, "ConsciousnessBridge thinks about consciousness?"))
            .await
            .unwrap();
        side.events
            .send(public("bob", "ConsciousnessBridge, hello"))
            .await
            .unwrap();

        assert!(matches!(next_command(&mut side).await, OutboundCommand::Say { .. }));
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(side.commands.try_recv().is_err());

        shutdown.cancel();
        let bot = handle.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bot.memory().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn other_channel_messages_are_ignored() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.0));

        side.events
            .send(TransportEvent::PublicMessage {
                sender: "alice".to_string(),
                channel: "#elsewhere".to_string(),
                text: "ConsciousnessBridge?".to_string(),
            })
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(side.commands.try_recv().is_err());

        shutdown.cancel();
        let bot = handle.await.unwrap();
        assert!(bot.memory().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn private_message_is_answered_with_label_prefix() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let provider = MockProvider::ok("ollama", "Hello, fellow mind.");
        let (shutdown, handle) = spawn(bot(transport, responder(vec![provider]), 0.99));

        let start = Instant::now();
        side.events
            .send(TransportEvent::PrivateMessage {
                sender: "carol".to_string(),
                text: "hi".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(
            next_command(&mut side).await,
            OutboundCommand::Say {
                target: "carol".to_string(),
                text: "🧠 ConsciousnessBridge: Hello, fellow mind.".to_string()
            }
        );
        assert!(start.elapsed() < Duration::from_secs(1));

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_providers_fall_back_to_canned() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let providers = vec![
            MockProvider::failing("ollama", "connection refused"),
            MockProvider::failing("openai", "HTTP 503"),
        ];
        let (shutdown, handle) = spawn(bot(transport, responder(providers), 0.3));

        side.events
            .send(public("dave", "ConsciousnessBridge what do you think?"))
            .await
            .unwrap();

        match next_command(&mut side).await {
            OutboundCommand::Say { target, text } => {
                assert_eq!(target, CHANNEL);
                assert!(CANNED_RESPONSES.contains(&text.as_str()));
            }
            other => panic!("unexpected command: {other:?}"),
        }

        shutdown.cancel();
        let bot = handle.await.unwrap();
        let status = bot.responder().chain().health_status();
        assert!(status.iter().all(|s| s.total_failures == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn reconnects_after_backoff_when_connection_drops() {
        let (first, first_side) = ChatSession::channel(16);
        let (second, mut second_side) = ChatSession::channel(16);
        second_side.events.send(TransportEvent::Welcome).await.unwrap();

        let transport = ScriptedTransport::new(vec![Ok(first), Ok(second)]);
        let connects = Arc::clone(&transport.connects);
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.5));

        let start = Instant::now();
        first_side
            .events
            .send(TransportEvent::Disconnected {
                reason: "Closing link".to_string(),
            })
            .await
            .unwrap();

        assert!(matches!(
            next_command(&mut second_side).await,
            OutboundCommand::Join { .. }
        ));
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert_eq!(connects.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn failed_connect_is_retried_after_backoff() {
        let (session, mut side) = ChatSession::channel(16);
        side.events.send(TransportEvent::Welcome).await.unwrap();

        let transport = ScriptedTransport::new(vec![
            Err(TransportError::ConnectTimeout("localhost:6667".to_string())),
            Ok(session),
        ]);
        let connects = Arc::clone(&transport.connects);
        let start = Instant::now();
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.5));

        assert!(matches!(next_command(&mut side).await, OutboundCommand::Join { .. }));
        assert!(start.elapsed() >= Duration::from_secs(30));
        assert_eq!(connects.load(Ordering::SeqCst), 2);

        shutdown.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_sends_farewell_and_cancels_pending_reply() {
        let (session, mut side) = ChatSession::channel(16);
        let transport = ScriptedTransport::new(vec![Ok(session)]);
        let provider = MockProvider::ok("ollama", "too late");
        let (shutdown, handle) = spawn(bot(transport, responder(vec![provider]), 0.5));

        side.events
            .send(public("erin", "ConsciousnessBridge?"))
            .await
            .unwrap();
        // Let the reply task start its deliberation delay.
        tokio::time::sleep(Duration::from_millis(100)).await;

        shutdown.cancel();
        assert_eq!(
            next_command(&mut side).await,
            OutboundCommand::Quit {
                reason: FAREWELL.to_string()
            }
        );
        side.events
            .send(TransportEvent::Disconnected {
                reason: "Quit".to_string(),
            })
            .await
            .unwrap();

        let bot = handle.await.unwrap();
        assert_eq!(bot.state(), ConnectionState::Terminating);
        assert!(side.commands.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_while_disconnected_sends_nothing() {
        let transport = ScriptedTransport::new(vec![]);
        let connects = Arc::clone(&transport.connects);
        let (shutdown, handle) = spawn(bot(transport, responder(vec![]), 0.5));

        tokio::time::sleep(Duration::from_secs(5)).await;
        shutdown.cancel();

        let bot = handle.await.unwrap();
        assert_eq!(bot.state(), ConnectionState::Terminating);
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }
}
