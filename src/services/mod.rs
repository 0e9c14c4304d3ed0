//! Domain services used by the HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own identity verification and persistence concerns so
//! route handlers can stay focused on protocol translation and auth plumbing.

pub mod auth;
pub mod habit;
