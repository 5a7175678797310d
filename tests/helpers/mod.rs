//! Shared fixtures and assertions for the integration suites.

pub mod resolve_helpers;
pub mod symbol_assertions;
