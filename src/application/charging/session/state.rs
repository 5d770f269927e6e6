//! Session lifecycle
//!
//! `Created → Initializing → Active → Closing → Closed`. Commands are only
//! accepted while `Active`.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SessionState {
    Created = 0,
    Initializing = 1,
    Active = 2,
    Closing = 3,
    Closed = 4,
}

impl SessionState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Created,
            1 => Self::Initializing,
            2 => Self::Active,
            3 => Self::Closing,
            _ => Self::Closed,
        }
    }

    pub fn accepts_commands(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Created => "created",
            Self::Initializing => "initializing",
            Self::Active => "active",
            Self::Closing => "closing",
            Self::Closed => "closed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("invalid session transition from {from} to {to}")]
    InvalidTransition { from: SessionState, to: SessionState },
}

/// Lock-free holder for the current state.
#[derive(Debug)]
pub(crate) struct AtomicSessionState(AtomicU8);

impl AtomicSessionState {
    pub fn new() -> Self {
        Self(AtomicU8::new(SessionState::Created as u8))
    }

    pub fn get(&self) -> SessionState {
        SessionState::from_u8(self.0.load(Ordering::SeqCst))
    }

    /// Move from exactly `from` to `to`.
    pub fn transition(&self, from: SessionState, to: SessionState) -> Result<(), SessionError> {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| ())
            .map_err(|actual| SessionError::InvalidTransition {
                from: SessionState::from_u8(actual),
                to,
            })
    }

    /// Enter `Closing` from any state short of it. Returns the previous state.
    pub fn begin_closing(&self) -> Result<SessionState, SessionError> {
        let mut current = self.0.load(Ordering::SeqCst);
        loop {
            let state = SessionState::from_u8(current);
            if matches!(state, SessionState::Closing | SessionState::Closed) {
                return Err(SessionError::InvalidTransition {
                    from: state,
                    to: SessionState::Closing,
                });
            }
            match self.0.compare_exchange(
                current,
                SessionState::Closing as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return Ok(state),
                Err(actual) => current = actual,
            }
        }
    }

    pub fn set(&self, state: SessionState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path() {
        let state = AtomicSessionState::new();
        state
            .transition(SessionState::Created, SessionState::Initializing)
            .unwrap();
        state
            .transition(SessionState::Initializing, SessionState::Active)
            .unwrap();
        assert!(state.get().accepts_commands());
        assert_eq!(state.begin_closing(), Ok(SessionState::Active));
        assert!(!state.get().accepts_commands());
    }

    #[test]
    fn second_initialize_is_rejected() {
        let state = AtomicSessionState::new();
        state
            .transition(SessionState::Created, SessionState::Initializing)
            .unwrap();
        assert_eq!(
            state.transition(SessionState::Created, SessionState::Initializing),
            Err(SessionError::InvalidTransition {
                from: SessionState::Initializing,
                to: SessionState::Initializing,
            })
        );
    }

    #[test]
    fn closing_twice_is_rejected() {
        let state = AtomicSessionState::new();
        assert_eq!(state.begin_closing(), Ok(SessionState::Created));
        assert!(state.begin_closing().is_err());
    }
}
