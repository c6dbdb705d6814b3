//! Reader link state tracking.
//!
//! The link moves through three phases:
//!
//! - `Closed`: no usable link, either no driver handle or the driver
//!   reported a disconnection
//! - `Opening`: a driver handle exists and the reader is powering up
//! - `Connected`: the reader is ready for swipes
//!
//! # Valid Transitions
//!
//! - Closed → Opening → Connected → Closed
//! - Opening → Closed (torn down or disconnected before connecting)
//! - Closed → Connected (driver reconnects on its own after a disconnection)
//!
//! # Examples
//!
//! ```
//! use magswipe_session::{ConnectionState, LinkStateMachine};
//!
//! let mut link = LinkStateMachine::new(10);
//! link.transition_to(ConnectionState::Opening).unwrap();
//! link.transition_to(ConnectionState::Connected).unwrap();
//!
//! assert!(link.transition_to(ConnectionState::Opening).is_err());
//! assert_eq!(link.history().len(), 2);
//! ```

use crate::error::{Result, SessionError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Phase of the reader link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Closed,
    Opening,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Closed => "Closed",
            ConnectionState::Opening => "Opening",
            ConnectionState::Connected => "Connected",
        };
        f.write_str(name)
    }
}

impl ConnectionState {
    /// Whether moving from this state to `target` is allowed.
    ///
    /// # Examples
    ///
    /// ```
    /// use magswipe_session::ConnectionState;
    ///
    /// assert!(ConnectionState::Closed.can_transition_to(&ConnectionState::Opening));
    /// assert!(!ConnectionState::Connected.can_transition_to(&ConnectionState::Opening));
    /// ```
    pub fn can_transition_to(&self, target: &ConnectionState) -> bool {
        matches!(
            (self, target),
            (ConnectionState::Closed, ConnectionState::Opening | ConnectionState::Connected)
                | (ConnectionState::Opening, ConnectionState::Connected | ConnectionState::Closed)
                | (ConnectionState::Connected, ConnectionState::Closed)
        )
    }
}

/// One recorded link transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkTransition {
    pub from: ConnectionState,
    pub to: ConnectionState,
    pub at: DateTime<Utc>,
}

/// Link state with a bounded transition history.
#[derive(Debug, Clone)]
pub struct LinkStateMachine {
    current: ConnectionState,
    history: VecDeque<LinkTransition>,
    history_size: usize,
}

impl LinkStateMachine {
    /// Create a closed link keeping up to `history_size` transitions.
    pub fn new(history_size: usize) -> Self {
        Self {
            current: ConnectionState::Closed,
            history: VecDeque::with_capacity(history_size),
            history_size,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.current
    }

    pub fn is_connected(&self) -> bool {
        self.current == ConnectionState::Connected
    }

    /// Recorded transitions, oldest first.
    pub fn history(&self) -> &VecDeque<LinkTransition> {
        &self.history
    }

    /// Move to `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidTransition`] if the move is not
    /// allowed; the state is left unchanged.
    pub fn transition_to(&mut self, target: ConnectionState) -> Result<LinkTransition> {
        if !self.current.can_transition_to(&target) {
            return Err(SessionError::InvalidTransition {
                from: self.current,
                to: target,
            });
        }

        let transition = LinkTransition {
            from: self.current,
            to: target,
            at: Utc::now(),
        };
        self.current = target;
        self.record(transition.clone());

        Ok(transition)
    }

    fn record(&mut self, transition: LinkTransition) {
        if self.history_size == 0 {
            return;
        }
        if self.history.len() == self.history_size {
            self.history.pop_front();
        }
        self.history.push_back(transition);
    }
}

impl Default for LinkStateMachine {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_HISTORY_SIZE)
    }
}
