pub mod app;
pub mod auth;
pub mod clock;
pub mod config;
pub mod deadline;
pub mod draft;
pub mod error;
pub mod io;
pub mod lifecycle;
pub mod notification;
pub mod paths;
pub mod plan;
pub mod project;
pub mod reminder;
pub mod schedule;
pub mod seed;
pub mod stats;
pub mod store;
pub mod task;
pub mod team;
pub mod types;

pub use error::{NexusError, Result};
