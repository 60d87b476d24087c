/// Civic Service Library
///
/// The engagement core of the LinkGov civic platform: citizens post
/// area-tagged reports, comment, like/dislike, and chat in a shared forum.
/// Durable state lives in a hosted document database reached through the
/// `document-store` contract; identity comes from an authentication provider
/// behind the `auth` boundary. This crate owns session resolution, the live
/// post and forum feeds, comment threads, and engagement aggregation.
///
/// # Modules
///
/// - `auth`: Authentication provider boundary and sign-up flow
/// - `models`: Data structures for actors, posts, comments, forum messages
/// - `services`: Session resolver, feeds, comment threads, engagement totals
/// - `security`: Password hashing
/// - `storage`: Blob storage boundary for post images
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `logging`: Tracing subscriber setup
pub mod auth;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod security;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
