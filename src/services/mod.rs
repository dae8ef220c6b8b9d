//! Domain services used by websocket and HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! `store` persists records, `live` fans changes out to live queries and
//! `client` is the typed facade views and routes call. The remaining
//! modules back sign-in and file storage.

pub mod client;
pub mod email_auth;
pub mod live;
pub mod session;
pub mod storage;
pub mod store;
