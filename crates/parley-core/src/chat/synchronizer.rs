//! Chat feed synchronizer.
//!
//! `ChatSynchronizer` drives the message feed for the lifetime of a
//! session: one initial load, then fixed-interval background refreshes
//! that replace the window wholesale. Each authenticated session gets its
//! own run, identified by the session epoch and torn down through a
//! `CancellationToken`; results from a superseded run are dropped, never
//! applied.

use std::sync::Arc;
use std::time::Duration;

use parley_types::error::SendError;
use parley_types::session::{ActiveSession, SessionState};
use tokio::sync::{Mutex, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::chat::{FeedPhase, FeedState};
use crate::client::{AuthClient, ChatClient};
use crate::session::manager::SessionManager;
use crate::session::store::SessionStore;

/// Feed error text surfaced to screens when the initial load fails.
const LOAD_ERROR: &str = "Could not load messages.";

/// The currently running refresh loop, if any.
///
/// All feed mutations check this slot first: a result may only be applied
/// while the epoch that produced it is still the one in the slot and its
/// token is uncancelled.
struct RunSlot {
    epoch: Uuid,
    cancel: CancellationToken,
}

/// Keeps the message feed synchronized with the backend.
///
/// Generic over `ChatClient` plus the session manager's own parameters so
/// a forced logout can be triggered from refresh failures. State flows out
/// through a watch channel; `drive` maps session transitions to
/// `start`/`stop`.
pub struct ChatSynchronizer<C, S, A>
where
    C: ChatClient,
    S: SessionStore,
    A: AuthClient,
{
    chat: C,
    session: Arc<SessionManager<S, A>>,
    state: watch::Sender<FeedState>,
    run: Mutex<Option<RunSlot>>,
    refresh_interval: Duration,
    history_limit: u32,
}

impl<C, S, A> ChatSynchronizer<C, S, A>
where
    C: ChatClient + 'static,
    S: SessionStore + 'static,
    A: AuthClient + 'static,
{
    /// Create a synchronizer in the `Inactive` state.
    pub fn new(
        chat: C,
        session: Arc<SessionManager<S, A>>,
        refresh_interval: Duration,
        history_limit: u32,
    ) -> Self {
        let (state, _) = watch::channel(FeedState::inactive());
        Self {
            chat,
            session,
            state,
            run: Mutex::new(None),
            refresh_interval,
            history_limit,
        }
    }

    /// Snapshot of the current feed state.
    pub fn feed_state(&self) -> FeedState {
        self.state.borrow().clone()
    }

    /// Subscribe to feed state changes.
    pub fn subscribe(&self) -> watch::Receiver<FeedState> {
        self.state.subscribe()
    }

    /// Begin a refresh run for the given session.
    ///
    /// Idempotent per epoch. A run for a different epoch is cancelled and
    /// superseded; its in-flight results become unappliable the moment the
    /// slot changes hands.
    pub async fn start(self: &Arc<Self>, active: &ActiveSession) {
        let cancel = CancellationToken::new();
        {
            let mut run = self.run.lock().await;
            if let Some(slot) = run.as_ref() {
                if slot.epoch == active.epoch && !slot.cancel.is_cancelled() {
                    return;
                }
            }
            if let Some(stale) = run.take() {
                stale.cancel.cancel();
            }
            *run = Some(RunSlot {
                epoch: active.epoch,
                cancel: cancel.clone(),
            });
            self.state.send_replace(FeedState::loading());
        }
        info!(username = %active.user.username, "Feed synchronization started");
        tokio::spawn(Arc::clone(self).run_loop(active.epoch, cancel));
    }

    /// Tear down the current run and clear the feed.
    ///
    /// The cancellation fires before the feed clears, and both happen with
    /// the run slot held, so no refresh result can slip in between.
    pub async fn stop(&self) {
        let mut run = self.run.lock().await;
        let Some(slot) = run.take() else {
            return;
        };
        slot.cancel.cancel();
        self.state.send_replace(FeedState::inactive());
        debug!("Feed synchronization stopped");
    }

    /// Post a message to the room.
    ///
    /// Whitespace-only text fails locally before any network call. When
    /// the backend echoes the created record it is appended in place;
    /// when it merely accepts, the feed is refreshed immediately so the
    /// message shows up without waiting for the next tick.
    pub async fn send(&self, text: &str) -> Result<(), SendError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SendError::EmptyText);
        }

        let (epoch, cancel) = {
            let run = self.run.lock().await;
            match run.as_ref() {
                Some(slot) if !slot.cancel.is_cancelled() => (slot.epoch, slot.cancel.clone()),
                _ => return Err(SendError::Inactive),
            }
        };

        match self.chat.send_message(text).await {
            Ok(receipt) => {
                if let Some(message) = receipt.into_message() {
                    debug!(message_id = message.id, "Message echoed, appending to feed");
                    self.apply(epoch, move |state| {
                        state.feed.push(message);
                    })
                    .await;
                } else {
                    debug!("Message accepted without echo, refreshing feed");
                    self.refresh(epoch, &cancel, false).await;
                }
                Ok(())
            }
            Err(error) if error.is_unauthorized() => {
                warn!("Send rejected by backend, ending session");
                self.session.logout().await;
                Err(SendError::Api(error))
            }
            Err(error) => Err(SendError::Api(error)),
        }
    }

    /// Refresh the feed now instead of waiting for the next tick.
    ///
    /// Returns false when there is no live run to refresh.
    pub async fn refresh_now(&self) -> bool {
        let (epoch, cancel) = {
            let run = self.run.lock().await;
            match run.as_ref() {
                Some(slot) if !slot.cancel.is_cancelled() => (slot.epoch, slot.cancel.clone()),
                _ => return false,
            }
        };
        self.refresh(epoch, &cancel, false).await
    }

    /// Map session transitions to feed runs until `shutdown` fires.
    ///
    /// `Uninitialized` is deliberately ignored: nothing may act before the
    /// one-shot hydration has resolved.
    pub async fn drive(self: Arc<Self>, shutdown: CancellationToken) {
        let mut session_rx = self.session.subscribe();
        loop {
            let state = session_rx.borrow_and_update().clone();
            match state {
                SessionState::Authenticated(active) => self.start(&active).await,
                SessionState::Anonymous => self.stop().await,
                SessionState::Uninitialized => {}
            }
            tokio::select! {
                _ = shutdown.cancelled() => break,
                changed = session_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        self.stop().await;
    }

    async fn run_loop(self: Arc<Self>, epoch: Uuid, cancel: CancellationToken) {
        debug!(%epoch, "Feed run started");
        let mut ticker = tokio::time::interval(self.refresh_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick resolves immediately and doubles as the initial
        // load; the cadence starts one interval after it.
        let mut initial = true;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if !self.refresh(epoch, &cancel, initial).await {
                        break;
                    }
                    initial = false;
                }
            }
        }
        debug!(%epoch, "Feed run ended");
    }

    /// Fetch the latest window and apply it.
    ///
    /// Returns whether the run should keep going. A rejected token ends
    /// the whole session, not just the run.
    async fn refresh(&self, epoch: Uuid, cancel: &CancellationToken, initial: bool) -> bool {
        let result = self.chat.list_messages(self.history_limit).await;
        if cancel.is_cancelled() {
            return false;
        }
        match result {
            Ok(messages) => {
                self.apply(epoch, move |state| {
                    state.phase = FeedPhase::Active;
                    state.feed.replace_all(messages);
                    state.last_error = None;
                })
                .await
            }
            Err(error) if error.is_unauthorized() => {
                warn!("Feed refresh rejected by backend, ending session");
                self.session.logout().await;
                false
            }
            Err(error) if initial => {
                warn!(error = %error, "Initial feed load failed");
                self.apply(epoch, move |state| {
                    state.phase = FeedPhase::Active;
                    state.feed.clear();
                    state.last_error = Some(LOAD_ERROR.to_string());
                })
                .await
            }
            Err(error) => {
                // Background failure: the feed and any visible error line
                // stand as they are until a fetch succeeds.
                debug!(error = %error, "Feed refresh failed, keeping current feed");
                true
            }
        }
    }

    /// Apply a feed mutation if `epoch` still owns the run slot.
    ///
    /// Returns false (and drops the mutation) when the run has been
    /// superseded or cancelled in the meantime.
    async fn apply<F>(&self, epoch: Uuid, mutate: F) -> bool
    where
        F: FnOnce(&mut FeedState),
    {
        let run = self.run.lock().await;
        match run.as_ref() {
            Some(slot) if slot.epoch == epoch && !slot.cancel.is_cancelled() => {
                self.state.send_modify(mutate);
                true
            }
            _ => {
                debug!(%epoch, "Dropping feed update from superseded run");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use parley_types::error::{ApiError, StoreError};
    use parley_types::message::{Message, SendReceipt};
    use parley_types::session::{AuthGrant, Credentials};
    use parley_types::user::User;
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    const FOREVER: Duration = Duration::from_secs(3600);

    fn user(name: &str) -> User {
        User {
            id: 1,
            username: name.to_string(),
            created_at: Utc::now(),
        }
    }

    fn msg(id: i64, text: &str) -> Message {
        Message {
            id,
            text: text.to_string(),
            member_username: "alice".to_string(),
            created_at: Utc::now(),
        }
    }

    // --- fakes -----------------------------------------------------------

    struct NullStore;

    impl SessionStore for NullStore {
        async fn load_token(&self) -> Result<Option<String>, StoreError> {
            Ok(None)
        }
        async fn load_user(&self) -> Result<Option<User>, StoreError> {
            Ok(None)
        }
        async fn save(&self, _token: &str, _user: &User) -> Result<(), StoreError> {
            Ok(())
        }
        async fn clear(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct FakeAuth;

    impl AuthClient for FakeAuth {
        async fn register(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
            self.login(credentials).await
        }
        async fn login(&self, credentials: &Credentials) -> Result<AuthGrant, ApiError> {
            Ok(AuthGrant {
                token: "tok123".to_string(),
                user: user(&credentials.username),
            })
        }
        async fn logout(&self) -> Result<(), ApiError> {
            Ok(())
        }
    }

    /// Scripted chat backend. Once the list script is exhausted the last
    /// entry repeats, so stray background ticks cannot change the feed
    /// out from under an assertion.
    #[derive(Default)]
    struct FakeChat {
        lists: StdMutex<Vec<Result<Vec<Message>, ApiError>>>,
        sends: StdMutex<Vec<Result<SendReceipt, ApiError>>>,
        list_calls: AtomicUsize,
        send_calls: AtomicUsize,
        gate: StdMutex<Option<Arc<Notify>>>,
    }

    impl FakeChat {
        fn listing(script: Vec<Result<Vec<Message>, ApiError>>) -> Arc<Self> {
            Arc::new(Self {
                lists: StdMutex::new(script),
                ..Self::default()
            })
        }

        fn queue_send(&self, receipt: Result<SendReceipt, ApiError>) {
            self.sends.lock().unwrap().push(receipt);
        }

        fn gate_lists(&self, gate: Arc<Notify>) {
            *self.gate.lock().unwrap() = Some(gate);
        }
    }

    impl ChatClient for Arc<FakeChat> {
        async fn list_messages(&self, _limit: u32) -> Result<Vec<Message>, ApiError> {
            let call = self.list_calls.fetch_add(1, Ordering::SeqCst);
            let gate = self.gate.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            let lists = self.lists.lock().unwrap();
            match lists.get(call).or_else(|| lists.last()) {
                Some(result) => result.clone(),
                None => Ok(Vec::new()),
            }
        }

        async fn send_message(&self, _text: &str) -> Result<SendReceipt, ApiError> {
            let call = self.send_calls.fetch_add(1, Ordering::SeqCst);
            let sends = self.sends.lock().unwrap();
            match sends.get(call) {
                Some(result) => result.clone(),
                None => Ok(SendReceipt::Accepted),
            }
        }
    }

    type TestSync = ChatSynchronizer<Arc<FakeChat>, NullStore, FakeAuth>;

    async fn logged_in_manager() -> Arc<SessionManager<NullStore, FakeAuth>> {
        let manager = Arc::new(SessionManager::new(NullStore, FakeAuth));
        manager.initialize().await;
        manager
            .login(&Credentials::new("alice", "pw"))
            .await
            .unwrap();
        manager
    }

    fn sync_with(
        chat: Arc<FakeChat>,
        manager: Arc<SessionManager<NullStore, FakeAuth>>,
        interval: Duration,
    ) -> Arc<TestSync> {
        Arc::new(ChatSynchronizer::new(chat, manager, interval, 50))
    }

    async fn start_current(sync: &Arc<TestSync>, manager: &SessionManager<NullStore, FakeAuth>) {
        let state = manager.state();
        let active = state.session().unwrap().clone();
        sync.start(&active).await;
    }

    // --- tests -----------------------------------------------------------

    #[tokio::test]
    async fn initial_load_populates_feed() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "hello"), msg(2, "hi")])]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.phase == FeedPhase::Active).await.unwrap();

        let state = sync.feed_state();
        assert_eq!(state.feed.len(), 2);
        assert_eq!(state.last_error, None);
    }

    #[tokio::test]
    async fn initial_load_failure_is_visible_with_empty_feed() {
        let chat = FakeChat::listing(vec![Err(ApiError::Network("refused".to_string()))]);
        let manager = logged_in_manager().await;
        let sync = sync_with(chat, Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.phase == FeedPhase::Active).await.unwrap();

        let state = sync.feed_state();
        assert!(state.feed.is_empty());
        assert_eq!(state.last_error.as_deref(), Some(LOAD_ERROR));
    }

    #[tokio::test(start_paused = true)]
    async fn background_tick_replaces_feed_wholesale() {
        let chat = FakeChat::listing(vec![
            Ok(vec![msg(1, "old")]),
            Ok(vec![msg(2, "new"), msg(3, "newer")]),
        ]);
        let manager = logged_in_manager().await;
        let sync = sync_with(chat, Arc::clone(&manager), Duration::from_secs(5));

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        rx.wait_for(|s| s.feed.as_slice().iter().any(|m| m.id == 3))
            .await
            .unwrap();
        let state = sync.feed_state();
        assert_eq!(state.feed.len(), 2);
        assert!(!state.feed.as_slice().iter().any(|m| m.id == 1));
    }

    #[tokio::test(start_paused = true)]
    async fn background_failure_keeps_current_feed_and_stays_quiet() {
        let chat = FakeChat::listing(vec![
            Ok(vec![msg(1, "kept")]),
            Err(ApiError::Network("refused".to_string())),
        ]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), Duration::from_secs(5));

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        // Sleep past the next tick; the paused clock runs the failing
        // refresh before waking us.
        tokio::time::sleep(Duration::from_secs(6)).await;

        assert!(chat.list_calls.load(Ordering::SeqCst) >= 2);
        let state = sync.feed_state();
        assert_eq!(state.phase, FeedPhase::Active);
        assert_eq!(state.feed.len(), 1);
        assert_eq!(state.feed.as_slice()[0].text, "kept");
        assert_eq!(state.last_error, None);
    }

    #[tokio::test(start_paused = true)]
    async fn unauthorized_refresh_ends_session_and_run() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "a")]), Err(ApiError::Unauthorized)]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), Duration::from_secs(5));
        let shutdown = CancellationToken::new();
        tokio::spawn(Arc::clone(&sync).drive(shutdown.clone()));

        let mut session_rx = manager.subscribe();
        session_rx
            .wait_for(|s| *s == SessionState::Anonymous)
            .await
            .unwrap();
        let mut feed_rx = sync.subscribe();
        feed_rx
            .wait_for(|s| s.phase == FeedPhase::Inactive)
            .await
            .unwrap();

        // The run is gone; more time must not produce more fetches.
        let fetches = chat.list_calls.load(Ordering::SeqCst);
        tokio::time::advance(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;
        assert_eq!(chat.list_calls.load(Ordering::SeqCst), fetches);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn send_rejects_blank_text_without_network() {
        let chat = FakeChat::listing(vec![]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);
        start_current(&sync, &manager).await;

        let err = sync.send("   \t  ").await.unwrap_err();

        assert!(matches!(err, SendError::EmptyText));
        assert_eq!(chat.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn send_outside_a_run_is_rejected() {
        let chat = FakeChat::listing(vec![]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), manager, FOREVER);

        let err = sync.send("hello").await.unwrap_err();

        assert!(matches!(err, SendError::Inactive));
        assert_eq!(chat.send_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn send_with_echo_appends_exactly_one_entry() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "a")])]);
        chat.queue_send(Ok(SendReceipt::Created(msg(2, "mine"))));
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        sync.send("mine").await.unwrap();

        let state = sync.feed_state();
        assert_eq!(state.feed.len(), 2);
        assert_eq!(state.feed.as_slice()[1].id, 2);
        // No refresh was needed for the echo path.
        assert_eq!(chat.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn send_without_echo_refreshes_immediately() {
        let chat = FakeChat::listing(vec![
            Ok(vec![msg(1, "a")]),
            Ok(vec![msg(1, "a"), msg(2, "mine")]),
        ]);
        chat.queue_send(Ok(SendReceipt::Accepted));
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        sync.send("mine").await.unwrap();

        let state = sync.feed_state();
        assert_eq!(state.feed.len(), 2);
        assert_eq!(chat.list_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn manual_refresh_picks_up_new_messages() {
        let chat = FakeChat::listing(vec![
            Ok(vec![msg(1, "a")]),
            Ok(vec![msg(1, "a"), msg(2, "b")]),
        ]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        assert!(sync.refresh_now().await);

        assert_eq!(sync.feed_state().feed.len(), 2);
    }

    #[tokio::test]
    async fn manual_refresh_without_a_run_is_a_noop() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "a")])]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), manager, FOREVER);

        assert!(!sync.refresh_now().await);
        assert_eq!(chat.list_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn send_unauthorized_forces_logout() {
        let chat = FakeChat::listing(vec![Ok(vec![])]);
        chat.queue_send(Err(ApiError::Unauthorized));
        let manager = logged_in_manager().await;
        let sync = sync_with(chat, Arc::clone(&manager), FOREVER);
        start_current(&sync, &manager).await;

        let err = sync.send("hello").await.unwrap_err();

        assert!(matches!(err, SendError::Api(ApiError::Unauthorized)));
        assert_eq!(manager.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn result_landing_after_logout_is_dropped() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "late")])]);
        let gate = Arc::new(Notify::new());
        chat.gate_lists(Arc::clone(&gate));
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);
        let shutdown = CancellationToken::new();
        tokio::spawn(Arc::clone(&sync).drive(shutdown.clone()));

        // Wait until the initial fetch is in flight, held open by the gate.
        while chat.list_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        manager.logout().await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.phase == FeedPhase::Inactive).await.unwrap();

        // Release the stale fetch; its result must not resurrect the feed.
        gate.notify_one();
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let state = sync.feed_state();
        assert_eq!(state.phase, FeedPhase::Inactive);
        assert!(state.feed.is_empty());
        shutdown.cancel();
    }

    #[tokio::test]
    async fn stop_cancels_run_and_clears_feed() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "a")])]);
        let manager = logged_in_manager().await;
        let sync = sync_with(chat, Arc::clone(&manager), FOREVER);

        start_current(&sync, &manager).await;
        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        sync.stop().await;

        let state = sync.feed_state();
        assert_eq!(state.phase, FeedPhase::Inactive);
        assert!(state.feed.is_empty());
        assert!(matches!(
            sync.send("hello").await.unwrap_err(),
            SendError::Inactive
        ));
    }

    #[tokio::test]
    async fn relogin_supersedes_previous_run() {
        let chat = FakeChat::listing(vec![Ok(vec![msg(1, "first run")]), Ok(vec![msg(9, "second run")])]);
        let manager = logged_in_manager().await;
        let sync = sync_with(Arc::clone(&chat), Arc::clone(&manager), FOREVER);
        let shutdown = CancellationToken::new();
        tokio::spawn(Arc::clone(&sync).drive(shutdown.clone()));

        let mut rx = sync.subscribe();
        rx.wait_for(|s| s.feed.len() == 1).await.unwrap();

        // Fresh login mints a new epoch; drive restarts the run.
        manager
            .login(&Credentials::new("alice", "pw"))
            .await
            .unwrap();
        rx.wait_for(|s| s.feed.as_slice().first().map(|m| m.id) == Some(9))
            .await
            .unwrap();
        shutdown.cancel();
    }
}
