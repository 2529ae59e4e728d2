//! # medcare
//!
//! Client library for the `MedCare` consultation platform.
//!
//! DESIGN
//! ======
//! The crate is split the same way the web front end was: `net` speaks to the
//! REST backend, `state` owns the session (token, user, loading/error flags)
//! and its durable copy, `guard` decides what a protected view may render,
//! and `forms` validates user input before anything touches the network.
//! `services` holds the smaller flows that do not mutate the session
//! (email verification, profile settings, Google authorization URLs).
//!
//! Nothing here is a global: a [`SessionStore`] is constructed explicitly
//! from an [`AuthApi`] implementation and a [`KeyValueStore`], so tests and
//! embedders get isolated instances.

pub mod config;
pub mod forms;
pub mod guard;
pub mod net;
pub mod services;
pub mod state;

pub use config::ClientConfig;
pub use guard::{GuardDecision, evaluate};
pub use net::api::{AuthApi, HttpApi};
pub use net::types::{ApiError, Role, User};
pub use state::session::{AuthPhase, Session};
pub use state::storage::{FileStore, KeyValueStore, MemoryStore};
pub use state::store::{AuthError, InitOutcome, SessionStore};
