//! Sessiongate - token-based authentication and session lifetime service
//!
//! Issues short-lived access tokens paired with a rotating refresh token whose
//! single valid value per identity is held in an external session store.

pub mod core;
