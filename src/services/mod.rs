//! Backend-facing features layered on top of the session store.
//!
//! DESIGN
//! ======
//! Services are free functions (or small helper types) that take the
//! `SessionStore` or an `AuthApi` explicitly. None of them own state of their
//! own except the OAuth code cache, which the store holds.

pub mod oauth;
pub mod profile;
pub mod verification;
