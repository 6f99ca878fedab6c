/// Process-level settings read from the environment
pub mod app;

/// Database configuration and connection management
pub mod database;

/// Competition environment info loaded from envinfo.toml
pub mod envinfo;
