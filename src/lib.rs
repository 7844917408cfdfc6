//! LiveAvatar Core Library
//!
//! Token gateway for avatar streaming sessions, the session coordinator that
//! drives the avatar SDK, and the view model rendered on top of it.

pub mod config;
pub mod gateway;
pub mod session;
pub mod telemetry;
pub mod view;
