//! Client-side session state.
//!
//! DESIGN
//! ======
//! `session` is the plain snapshot every consumer reads, `storage` is the
//! durable key-value copy of the credentials, and `store` is the only place
//! that mutates either. Keeping mutation in one type is what lets the store
//! guarantee that memory and storage never disagree after an operation.

pub mod session;
pub mod storage;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
