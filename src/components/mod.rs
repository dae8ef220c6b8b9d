//! Shared UI components.

pub mod access_code_email;
pub mod cards;
pub mod layout;
