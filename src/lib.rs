//! FaceAuth client.
//!
//! ARCHITECTURE
//! ============
//! `net` talks to the registration backend, `state::session` holds the
//! signed-in identity on top of it, `router` decides which pages need that
//! identity, and `pages` turn form input into session calls and user-facing
//! messages. `store` persists the token (and the binary's cookie jar) between
//! runs; `config` reads the environment.

pub mod config;
pub mod net;
pub mod pages;
pub mod router;
pub mod state;
pub mod store;

#[cfg(test)]
pub(crate) mod test_helpers;
