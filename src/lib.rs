// ABOUTME: Root library module exposing the platform adapters and logging setup
// ABOUTME: Re-exports the platform-agnostic modules from tagall-core

pub mod logging;
pub mod platform;

pub use tagall_core::commands;
pub use tagall_core::config;
pub use tagall_core::paths;
pub use tagall_core::traits;
