//! tourbase - An embeddable tour booking core
//!
//! In-memory document store with a Mongo-style query pipeline and
//! live rating aggregation, wired together behind [`Platform`].

pub mod auth;
pub mod config;
pub mod mailer;
pub mod models;
pub mod platform;
pub mod query;
pub mod ratings;
pub mod resource;
pub mod services;
pub mod store;

pub use config::PlatformConfig;
pub use platform::Platform;
