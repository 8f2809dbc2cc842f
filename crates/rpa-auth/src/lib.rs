//! Client-side session guard for the user and admin surfaces.
//!
//! This crate provides:
//! - A single claim-verification routine shared by every surface
//! - An explicit, injectable `AuthSession` (two-state FSM over the token store)
//! - A typed logout signal with ordered, synchronous delivery
//! - Pure route-guard decisions (`Protected` / `Public`)
//!
//! The session never talks to the network. Obtaining tokens and reacting to
//! HTTP 401s is the job of `rpa-api-client`.

mod claims;
mod error;
mod guard;
mod machine;
mod session;
mod signal;
mod surface;

pub use claims::{decode_claims, normalize_token, verify_token, TokenRejection, TokenVerdict};
pub use error::{AuthError, AuthResult};
pub use guard::{RouteDecision, RouteGuard};
pub use machine::session_machine;
pub use machine::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use session::{AuthSession, AuthSnapshot, AuthStateCallback, AuthStateChanged, Profile};
pub use signal::{LogoutNotice, LogoutReason, LogoutSignal, SubscriptionId};
pub use surface::{ParseSurfaceError, Surface};
