//! The session state machine.
//!
//! All state is owned by `Bootstrapper` and mutated only by the task that
//! drives it. Network fetches run in spawned tasks and report back through an
//! MPSC channel; the identity provider's completion handler posts into the
//! same channel, so every state change is applied in one place.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::api::{AssignmentFetcher, FetchError, ProfileFetcher};
use crate::auth::{CredentialStore, IdentityProvider, SIGN_IN_MOUNT_ID};
use crate::cache::CacheManager;
use crate::models::{Assignment, Profile, Session};
use crate::view::{render, RenderOptions, RenderTarget};

use super::SessionState;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the event channel.
/// At most two fetches and a handful of UI events are ever queued at once.
const CHANNEL_BUFFER_SIZE: usize = 32;

// ============================================================================
// Events
// ============================================================================

/// Inputs to the state machine, delivered through the event channel.
enum SessionEvent {
    /// The identity provider finished an external sign-in
    CredentialReceived(String),
    /// A profile fetch started under `epoch` completed
    ProfileLoaded {
        epoch: u64,
        result: Result<Profile, FetchError>,
    },
    /// The assignment fetch completed
    AssignmentsLoaded(Result<Vec<Assignment>, FetchError>),
    /// The user asked to sign out
    SignOutRequested,
    /// Stop `run` after the events queued before this one
    Shutdown,
}

/// The capabilities the bootstrapper orchestrates.
pub struct Services {
    pub credentials: Box<dyn CredentialStore>,
    pub identity: Box<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileFetcher>,
    pub assignments: Arc<dyn AssignmentFetcher>,
    pub target: Box<dyn RenderTarget>,
}

/// Sends UI events to a running bootstrapper.
#[derive(Clone)]
pub struct BootstrapHandle {
    tx: mpsc::Sender<SessionEvent>,
}

impl BootstrapHandle {
    /// Queue a sign-out. Returns false if the bootstrapper is gone.
    pub async fn sign_out(&self) -> bool {
        self.tx.send(SessionEvent::SignOutRequested).await.is_ok()
    }

    /// Ask `Bootstrapper::run` to return. Returns false if the bootstrapper is gone.
    pub async fn shutdown(&self) -> bool {
        self.tx.send(SessionEvent::Shutdown).await.is_ok()
    }
}

// ============================================================================
// Bootstrapper
// ============================================================================

pub struct Bootstrapper {
    // Services
    credentials: Box<dyn CredentialStore>,
    identity: Box<dyn IdentityProvider>,
    profiles: Arc<dyn ProfileFetcher>,
    assignment_source: Arc<dyn AssignmentFetcher>,
    target: Box<dyn RenderTarget>,
    cache: Option<CacheManager>,
    options: RenderOptions,

    // State
    state: SessionState,
    session: Option<Session>,
    assignments: Vec<Assignment>,

    /// Bumped on every sign-in and sign-out; profile results from an older
    /// epoch are discarded.
    epoch: u64,
    /// Fetches started but not yet processed
    in_flight: usize,

    events_tx: mpsc::Sender<SessionEvent>,
    events_rx: mpsc::Receiver<SessionEvent>,
}

impl Bootstrapper {
    /// Create the bootstrapper and register its completion handler with the
    /// identity provider.
    pub fn new(client_id: &str, services: Services, options: RenderOptions) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        let Services {
            credentials,
            mut identity,
            profiles,
            assignments,
            target,
        } = services;

        let callback_tx = tx.clone();
        identity.initialize(
            client_id,
            Box::new(move |token| {
                match callback_tx.try_send(SessionEvent::CredentialReceived(token)) {
                    Ok(()) => true,
                    Err(e) => {
                        error!(error = %e, "Failed to queue sign-in credential");
                        false
                    }
                }
            }),
        );

        Self {
            credentials,
            identity,
            profiles,
            assignment_source: assignments,
            target,
            cache: None,
            options,
            state: SessionState::Unknown,
            session: None,
            assignments: Vec::new(),
            epoch: 0,
            in_flight: 0,
            events_tx: tx,
            events_rx: rx,
        }
    }

    /// Seed the assignment list from, and save fetched lists to, `cache`.
    pub fn with_cache(mut self, cache: CacheManager) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn handle(&self) -> BootstrapHandle {
        BootstrapHandle {
            tx: self.events_tx.clone(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    /// True when no fetch is waiting to be processed.
    pub fn is_settled(&self) -> bool {
        self.in_flight == 0
    }

    // =========================================================================
    // Transitions
    // =========================================================================

    /// Page load: restore the session from a stored token, fetch assignments, render.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(&mut self) {
        info!("Bootstrapping session");
        self.seed_from_cache();

        match self.load_token() {
            Some(token) => {
                debug!("Stored credential found");
                self.begin_sign_in(token);
            }
            None => {
                debug!("No stored credential");
                self.state = SessionState::SignedOut;
            }
        }

        self.spawn_assignment_fetch();
        self.redraw();
    }

    /// Forget the credential and the session.
    pub fn sign_out(&mut self) {
        info!("Signing out");
        if let Err(e) = self.credentials.clear() {
            warn!(error = %e, "Failed to clear stored credential");
        }

        self.epoch += 1;
        self.session = None;
        self.state = SessionState::SignedOut;
        self.redraw();
    }

    fn on_credential(&mut self, token: String) {
        info!("Credential received from identity provider");
        if let Err(e) = self.credentials.save(&token) {
            warn!(error = %e, "Failed to store credential");
        }

        self.begin_sign_in(token);
        self.redraw();
    }

    fn on_profile(&mut self, epoch: u64, result: Result<Profile, FetchError>) {
        if epoch != self.epoch {
            debug!(epoch, current = self.epoch, "Discarding stale profile result");
            return;
        }

        match result {
            Ok(profile) => {
                info!(name = %profile.name, "Signed in");
                self.session = Some(Session::from_profile(profile));
                self.state = SessionState::SignedIn;
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), "Profile fetch failed");
                if e.is_unauthorized() {
                    info!("Stored credential was rejected, clearing it");
                    if let Err(e) = self.credentials.clear() {
                        warn!(error = %e, "Failed to clear rejected credential");
                    }
                }
                self.session = None;
                self.state = SessionState::SignedOut;
            }
        }
        self.redraw();
    }

    fn on_assignments(&mut self, result: Result<Vec<Assignment>, FetchError>) {
        match result {
            Ok(assignments) => {
                info!(count = assignments.len(), "Assignments loaded");
                if let Some(ref cache) = self.cache {
                    if let Err(e) = cache.save_assignments(&assignments) {
                        warn!(error = %e, "Failed to cache assignments");
                    }
                }
                self.assignments = assignments;
            }
            Err(e) => {
                warn!(error = %e, kind = ?e.kind(), kept = self.assignments.len(), "Assignment fetch failed");
            }
        }
        self.redraw();
    }

    fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::CredentialReceived(token) => self.on_credential(token),
            SessionEvent::ProfileLoaded { epoch, result } => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_profile(epoch, result);
            }
            SessionEvent::AssignmentsLoaded(result) => {
                self.in_flight = self.in_flight.saturating_sub(1);
                self.on_assignments(result);
            }
            SessionEvent::SignOutRequested => self.sign_out(),
            SessionEvent::Shutdown => debug!("Shutdown ignored outside run"),
        }
    }

    // =========================================================================
    // Event loop
    // =========================================================================

    /// Apply every event that is already queued, without waiting.
    pub fn process_pending(&mut self) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
        }
    }

    /// Process events until no fetch is in flight and nothing is queued.
    pub async fn run_until_settled(&mut self) {
        loop {
            self.process_pending();
            if self.in_flight == 0 {
                break;
            }
            match self.events_rx.recv().await {
                Some(event) => self.handle_event(event),
                None => break,
            }
        }
    }

    /// Process events until `BootstrapHandle::shutdown` is received.
    ///
    /// Fetches still in flight at that point are abandoned.
    pub async fn run(&mut self) {
        while let Some(event) = self.events_rx.recv().await {
            if let SessionEvent::Shutdown = event {
                info!(in_flight = self.in_flight, "Session loop shutting down");
                return;
            }
            self.handle_event(event);
        }
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn load_token(&self) -> Option<String> {
        match self.credentials.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read stored credential");
                None
            }
        }
    }

    fn seed_from_cache(&mut self) {
        let Some(ref cache) = self.cache else {
            return;
        };
        match cache.load_assignments() {
            Ok(Some(cached)) => {
                debug!(count = cached.data.len(), age = %cached.age_display(), "Assignments seeded from cache");
                self.assignments = cached.data;
            }
            Ok(None) => {}
            Err(e) => debug!(error = %e, "Failed to load cached assignments"),
        }
    }

    fn begin_sign_in(&mut self, token: String) {
        self.epoch += 1;
        self.session = None;
        self.state = SessionState::SigningIn;
        self.in_flight += 1;

        let epoch = self.epoch;
        let profiles = Arc::clone(&self.profiles);
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = profiles.fetch_profile(&token).await;
            Self::send_event(&tx, SessionEvent::ProfileLoaded { epoch, result }).await;
        });
    }

    fn spawn_assignment_fetch(&mut self) {
        self.in_flight += 1;

        let source = Arc::clone(&self.assignment_source);
        let tx = self.events_tx.clone();

        tokio::spawn(async move {
            let result = source.fetch_assignments().await;
            Self::send_event(&tx, SessionEvent::AssignmentsLoaded(result)).await;
        });
    }

    async fn send_event(tx: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
        if let Err(e) = tx.send(event).await {
            error!(error = %e, "Failed to send session event - channel closed");
        }
    }

    /// Render the current state and hand it to the target.
    fn redraw(&mut self) {
        let mut page = render(self.session.as_ref(), &self.assignments, &self.options);
        if self.session.is_none() {
            let control = self.identity.render_button(SIGN_IN_MOUNT_ID);
            page = page.mount(SIGN_IN_MOUNT_ID, &control);
        }

        debug!(state = %self.state, "Rendering page");
        if let Err(e) = self.target.replace(&page) {
            error!(error = %e, "Failed to deliver rendered page");
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
