//! Session state machine using rust-fsm.
//!
//! ```text
//!               TokenRestored / LoginSucceeded
//!   ┌───────────┐ ─────────────────────────────► ┌───────────────┐
//!   │ Anonymous │                                │ Authenticated │ ◄─┐ LoginSucceeded
//!   └───────────┘ ◄───────────────────────────── └───────────────┘ ──┘
//!     ▲       │    LogoutRequested / LogoutBroadcast /
//!     └───────┘    ClaimRejected
//!   LogoutRequested / LogoutBroadcast
//! ```

use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Anonymous)

    Anonymous => {
        TokenRestored => Authenticated,
        LoginSucceeded => Authenticated,
        LogoutRequested => Anonymous,
        LogoutBroadcast => Anonymous
    },
    Authenticated => {
        LoginSucceeded => Authenticated,
        LogoutRequested => Anonymous,
        LogoutBroadcast => Anonymous,
        ClaimRejected => Anonymous
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Public view of the session machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

impl From<&SessionMachineState> for SessionState {
    fn from(state: &SessionMachineState) -> Self {
        match state {
            SessionMachineState::Anonymous => SessionState::Anonymous,
            SessionMachineState::Authenticated => SessionState::Authenticated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_of(machine: &SessionMachine) -> SessionState {
        SessionState::from(machine.state())
    }

    #[test]
    fn test_initial_state_is_anonymous() {
        let machine = SessionMachine::new();
        assert_eq!(state_of(&machine), SessionState::Anonymous);
    }

    #[test]
    fn test_restore_then_reject() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::TokenRestored).unwrap();
        assert!(state_of(&machine).is_authenticated());

        machine.consume(&SessionMachineInput::ClaimRejected).unwrap();
        assert_eq!(state_of(&machine), SessionState::Anonymous);
    }

    #[test]
    fn test_relogin_keeps_authenticated() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::LoginSucceeded).unwrap();
        machine.consume(&SessionMachineInput::LoginSucceeded).unwrap();
        assert_eq!(state_of(&machine), SessionState::Authenticated);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut machine = SessionMachine::new();
        machine.consume(&SessionMachineInput::LoginSucceeded).unwrap();
        machine.consume(&SessionMachineInput::LogoutRequested).unwrap();
        machine.consume(&SessionMachineInput::LogoutRequested).unwrap();
        machine.consume(&SessionMachineInput::LogoutBroadcast).unwrap();
        assert_eq!(state_of(&machine), SessionState::Anonymous);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut machine = SessionMachine::new();
        assert!(machine.consume(&SessionMachineInput::ClaimRejected).is_err());

        machine.consume(&SessionMachineInput::LoginSucceeded).unwrap();
        assert!(machine.consume(&SessionMachineInput::TokenRestored).is_err());
    }

    #[test]
    fn test_state_serializes_snake_case() {
        let json = serde_json::to_string(&SessionState::Authenticated).unwrap();
        assert_eq!(json, "\"authenticated\"");
    }
}
