//! Lifecycle state machine
//!
//! `Uninitialized -> Initialized -> Started -> Stopped`, with `Stopped ->
//! Started` allowed for restarts. Calls that do not apply to the current state
//! are no-ops, so repeating a transition is always safe.

use std::fmt;
use std::sync::{Mutex, PoisonError};
use tracing::debug;

/// Lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Constructed, nothing wired yet
    #[default]
    Uninitialized,
    /// Pipeline wiring done
    Initialized,
    /// Remote client handle constructed
    Started,
    /// Handle released
    Stopped,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "UNINITIALIZED"),
            Self::Initialized => write!(f, "INITIALIZED"),
            Self::Started => write!(f, "STARTED"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Lifecycle transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Wire into the host pipeline
    Init,
    /// Construct the remote client
    Start,
    /// Release the remote client
    Stop,
}

impl Transition {
    /// State reached after the transition
    #[must_use]
    pub fn target(self) -> LifecycleState {
        match self {
            Self::Init => LifecycleState::Initialized,
            Self::Start => LifecycleState::Started,
            Self::Stop => LifecycleState::Stopped,
        }
    }

    /// Whether the transition applies to `state`
    #[must_use]
    pub fn applies_to(self, state: LifecycleState) -> bool {
        use LifecycleState::{Initialized, Started, Stopped, Uninitialized};
        matches!(
            (self, state),
            (Self::Init, Uninitialized)
                | (Self::Start, Initialized | Stopped)
                | (Self::Stop, Started)
        )
    }
}

/// Tracks the lifecycle state and serializes transitions
#[derive(Debug, Default)]
pub struct Lifecycle {
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    /// Create a tracker in `Uninitialized`
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> LifecycleState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `action` and move to the transition's target state
    ///
    /// Transitions are serialized: `action` runs while no other transition can
    /// start. If the transition does not apply to the current state nothing
    /// runs and `Ok(false)` is returned. If `action` fails the state is left
    /// unchanged.
    pub fn transition<E>(
        &self,
        transition: Transition,
        action: impl FnOnce() -> Result<(), E>,
    ) -> Result<bool, E> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if !transition.applies_to(*state) {
            debug!(?transition, state = %*state, "Lifecycle transition ignored");
            return Ok(false);
        }

        action()?;
        debug!(?transition, from = %*state, to = %transition.target(), "Lifecycle transition");
        *state = transition.target();
        Ok(true)
    }
}
