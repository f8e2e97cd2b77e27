//! Credential storage
//!
//! The Groq API key is read from the environment, the OS keyring or a
//! private fallback file, in that order.

pub mod keyring;

pub use keyring::{delete_api_key, get_api_key, set_api_key, API_KEY_ENV};
