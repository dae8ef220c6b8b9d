//! View state behind the pages.
//!
//! ARCHITECTURE
//! ============
//! List views hold a live query and decode every snapshot into items; the
//! websocket pushes those items rendered as cards. Create views validate
//! and submit forms through the data client. Components and pages render
//! the markup.

pub mod create;
pub mod list;
