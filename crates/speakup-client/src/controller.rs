//! SOS activation state machine.
//!
//! ```text
//!          activate, no contacts
//!   Idle ─────────────────────────► AwaitingContacts ──dismiss──► Idle
//!    │ ▲
//!    │ │ cancel
//!    │ │
//!    ▼ │     tick (n > 1)
//!   CountingDown(n) ───────────► CountingDown(n - 1)
//!    │
//!    │ tick (n == 1)
//!    ▼
//!   Dispatching ──────────────► Completed(outcome) ──dismiss──► Idle
//! ```
//!
//! Only one attempt runs at a time: activating while counting down,
//! dispatching or showing a result is ignored. Every attempt gets a number;
//! countdown callbacks and dispatch results carrying an old number are
//! discarded, so nothing fires after a cancellation.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use speakup_shared::constants::SOS_COUNTDOWN_SECS;
use speakup_shared::time::alert_timestamp_now;
use speakup_shared::{AlertPayload, DispatchResult, EmergencyContact, GeoLocation};
use speakup_store::{ContactBook, StoreError};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::dispatch::AlertDispatcher;
use crate::error::{FailureCause, LocationError, SosFailure};
use crate::location::{acquire_location, LocationOptions, LocationProvider};
use crate::timer::{start_countdown, CancelHandle};

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// What happens when no location fix can be obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LocationPolicy {
    /// Send the alert with `location: null`; the alert says so explicitly.
    #[default]
    SendWithoutLocation,
    /// Give up and report a location failure.
    Abort,
}

impl FromStr for LocationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "send-without" | "send-without-location" => Ok(Self::SendWithoutLocation),
            "abort" => Ok(Self::Abort),
            other => Err(format!("unknown location policy: {other}")),
        }
    }
}

impl fmt::Display for LocationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendWithoutLocation => f.write_str("send-without"),
            Self::Abort => f.write_str("abort"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Countdown length in ticks (at least 1).
    pub countdown_secs: u32,
    /// Length of one tick; one second outside tests.
    pub tick: Duration,
    pub location: LocationOptions,
    pub location_policy: LocationPolicy,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            countdown_secs: SOS_COUNTDOWN_SECS,
            tick: Duration::from_secs(1),
            location: LocationOptions::default(),
            location_policy: LocationPolicy::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum SosState {
    Idle,
    /// Activation found no contacts; the user should add some.
    AwaitingContacts,
    /// `contacts` is how many people the alert will reach.
    CountingDown { remaining: u32, contacts: usize },
    Dispatching { contacts: usize },
    Completed(SosOutcome),
}

impl SosState {
    pub fn name(&self) -> &'static str {
        match self {
            SosState::Idle => "idle",
            SosState::AwaitingContacts => "awaiting_contacts",
            SosState::CountingDown { .. } => "counting_down",
            SosState::Dispatching { .. } => "dispatching",
            SosState::Completed(_) => "completed",
        }
    }

    /// An attempt owns the controller until it is dismissed.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            SosState::CountingDown { .. } | SosState::Dispatching { .. } | SosState::Completed(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SosOutcome {
    Sent {
        result: DispatchResult,
        location: Option<GeoLocation>,
        /// Set when the alert went out without a location.
        location_warning: Option<LocationError>,
    },
    Failed(SosFailure),
}

impl SosOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SosOutcome::Sent { .. })
    }

    /// One line for the user: the notified count or the remediation.
    pub fn headline(&self) -> String {
        match self {
            SosOutcome::Sent { result, .. } => result.notified_label(),
            SosOutcome::Failed(failure) => failure.message.clone(),
        }
    }

    pub fn map_link(&self) -> Option<String> {
        match self {
            SosOutcome::Sent {
                location: Some(location),
                ..
            } => Some(location.maps_url()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ActivateOutcome {
    CountdownStarted { contacts: usize },
    AwaitingContacts,
    /// Another attempt is in progress or awaiting dismissal.
    Ignored,
    Failed(SosFailure),
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct Machine {
    state: SosState,
    attempt: u64,
    countdown: Option<CancelHandle>,
    /// Contacts captured at activation; the alert goes to exactly these.
    pending: Vec<EmergencyContact>,
}

struct Inner {
    contacts: ContactBook,
    location: Arc<dyn LocationProvider>,
    dispatcher: Arc<dyn AlertDispatcher>,
    settings: ControllerSettings,
    machine: Mutex<Machine>,
    state_tx: watch::Sender<SosState>,
}

/// Owns the SOS lifecycle from button press to reported result.
///
/// Cheap to clone; clones share the same state. Must be used from within a
/// tokio runtime.
#[derive(Clone)]
pub struct SosController {
    inner: Arc<Inner>,
}

impl SosController {
    pub fn new(
        contacts: ContactBook,
        location: Arc<dyn LocationProvider>,
        dispatcher: Arc<dyn AlertDispatcher>,
        settings: ControllerSettings,
    ) -> Self {
        let (state_tx, _) = watch::channel(SosState::Idle);
        Self {
            inner: Arc::new(Inner {
                contacts,
                location,
                dispatcher,
                settings,
                machine: Mutex::new(Machine {
                    state: SosState::Idle,
                    attempt: 0,
                    countdown: None,
                    pending: Vec::new(),
                }),
                state_tx,
            }),
        }
    }

    pub fn state(&self) -> SosState {
        self.inner.state_tx.borrow().clone()
    }

    /// Every state change, including each countdown tick.
    pub fn subscribe(&self) -> watch::Receiver<SosState> {
        self.inner.state_tx.subscribe()
    }

    pub fn contacts(&self) -> Result<Vec<EmergencyContact>, StoreError> {
        self.inner.contacts.list()
    }

    pub fn add_contact(&self, name: &str, email: &str) -> Result<EmergencyContact, StoreError> {
        self.inner.contacts.add(name, email)
    }

    pub fn remove_contact(&self, index: usize) -> Result<EmergencyContact, StoreError> {
        self.inner.contacts.remove(index)
    }

    /// The user pressed SOS.
    pub fn activate(&self) -> ActivateOutcome {
        let inner = &self.inner;
        let mut m = inner.lock();

        if m.state.is_busy() {
            debug!(state = m.state.name(), "activation ignored, attempt in progress");
            return ActivateOutcome::Ignored;
        }

        let contacts = match inner.contacts.list() {
            Ok(contacts) => contacts,
            Err(e) => {
                warn!(error = %e, "could not load emergency contacts");
                let failure = SosFailure::new(FailureCause::ContactStorage, e.to_string());
                inner.transition(&mut m, SosState::Completed(SosOutcome::Failed(failure.clone())));
                return ActivateOutcome::Failed(failure);
            }
        };

        if contacts.is_empty() {
            info!("SOS activation without emergency contacts");
            inner.transition(&mut m, SosState::AwaitingContacts);
            return ActivateOutcome::AwaitingContacts;
        }

        m.attempt += 1;
        let attempt = m.attempt;
        let count = contacts.len();
        let from = inner.settings.countdown_secs.max(1);
        m.pending = contacts;
        inner.transition(
            &mut m,
            SosState::CountingDown {
                remaining: from,
                contacts: count,
            },
        );

        let tick_inner = inner.clone();
        let done_inner = inner.clone();
        m.countdown = Some(start_countdown(
            from,
            inner.settings.tick,
            move |remaining| tick_inner.on_tick(attempt, remaining),
            move || Inner::on_countdown_complete(&done_inner, attempt),
        ));

        info!(attempt, contacts = count, seconds = from, "SOS countdown started");
        ActivateOutcome::CountdownStarted { contacts: count }
    }

    /// Abort the countdown. Returns `false` outside the countdown; once
    /// dispatch has begun it cannot be cancelled.
    pub fn cancel(&self) -> bool {
        let inner = &self.inner;
        let mut m = inner.lock();

        if !matches!(m.state, SosState::CountingDown { .. }) {
            return false;
        }

        // Invalidate first so a tick already past the timer's check is
        // discarded when it reaches the lock.
        m.attempt += 1;
        if let Some(handle) = m.countdown.take() {
            handle.cancel();
        }
        m.pending.clear();
        inner.transition(&mut m, SosState::Idle);

        info!("SOS countdown cancelled");
        true
    }

    /// Acknowledge a result (or the missing-contacts prompt) and return to
    /// `Idle`.
    pub fn dismiss(&self) -> bool {
        let inner = &self.inner;
        let mut m = inner.lock();

        match m.state {
            SosState::Completed(_) | SosState::AwaitingContacts => {
                inner.transition(&mut m, SosState::Idle);
                true
            }
            _ => false,
        }
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Machine> {
        self.machine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, m: &mut Machine, next: SosState) {
        debug!(from = m.state.name(), to = next.name(), "SOS state change");
        m.state = next.clone();
        self.state_tx.send_replace(next);
    }

    fn on_tick(&self, attempt: u64, remaining: u32) {
        let mut m = self.lock();
        let contacts = match &m.state {
            SosState::CountingDown { contacts, .. } if m.attempt == attempt => *contacts,
            _ => {
                debug!(attempt, "stale countdown tick discarded");
                return;
            }
        };
        self.transition(&mut m, SosState::CountingDown { remaining, contacts });
    }

    fn on_countdown_complete(inner: &Arc<Inner>, attempt: u64) {
        let contacts = {
            let mut m = inner.lock();
            let count = match &m.state {
                SosState::CountingDown { contacts, .. } if m.attempt == attempt => *contacts,
                _ => {
                    debug!(attempt, "stale countdown completion discarded");
                    return;
                }
            };
            m.countdown = None;
            let contacts = std::mem::take(&mut m.pending);
            inner.transition(&mut m, SosState::Dispatching { contacts: count });
            contacts
        };

        let timestamp = alert_timestamp_now();
        let inner = inner.clone();
        tokio::spawn(async move {
            let outcome = inner.run_dispatch(contacts, timestamp).await;
            inner.finish(attempt, outcome);
        });
    }

    async fn run_dispatch(&self, contacts: Vec<EmergencyContact>, timestamp: String) -> SosOutcome {
        match acquire_location(self.location.as_ref(), &self.settings.location).await {
            Ok(location) => self.send(contacts, Some(location), timestamp, None).await,
            Err(e) => {
                warn!(error = %e, policy = %self.settings.location_policy, "no location fix");
                match self.settings.location_policy {
                    LocationPolicy::Abort => SosOutcome::Failed(SosFailure::from(&e)),
                    LocationPolicy::SendWithoutLocation => {
                        self.send(contacts, None, timestamp, Some(e)).await
                    }
                }
            }
        }
    }

    async fn send(
        &self,
        contacts: Vec<EmergencyContact>,
        location: Option<GeoLocation>,
        timestamp: String,
        location_warning: Option<LocationError>,
    ) -> SosOutcome {
        let payload = AlertPayload {
            contacts,
            location,
            timestamp,
        };

        match self.dispatcher.dispatch(&payload).await {
            Ok(result) if result.successful == 0 => {
                error!(failed = result.failed, "SOS dispatch reached no contacts");
                SosOutcome::Failed(SosFailure::new(FailureCause::Server, result.summary()))
            }
            Ok(result) => {
                info!(
                    successful = result.successful,
                    failed = result.failed,
                    "SOS alert dispatched"
                );
                SosOutcome::Sent {
                    result,
                    location,
                    location_warning,
                }
            }
            Err(e) => {
                error!(error = %e, "SOS dispatch failed");
                SosOutcome::Failed(SosFailure::from(&e))
            }
        }
    }

    fn finish(&self, attempt: u64, outcome: SosOutcome) {
        let mut m = self.lock();
        if m.attempt != attempt || !matches!(m.state, SosState::Dispatching { .. }) {
            warn!(attempt, "dispatch outcome for a superseded attempt dropped");
            return;
        }
        self.transition(&mut m, SosState::Completed(outcome));
    }
}
