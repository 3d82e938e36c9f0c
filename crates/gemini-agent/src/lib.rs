//! `gemini-agent`: async client for the Gemini `generateContent` REST API.
//!
//! Five calls back the AI features of `nexus`:
//!
//! | Call | Model | Output |
//! |------|-------|--------|
//! | [`GeminiClient::transcribe`] | fast | plain text |
//! | [`GeminiClient::refine_text`] | fast | plain text, original on failure |
//! | [`GeminiClient::parse_plan`] | pro, JSON schema | [`PlanResponse`] |
//! | [`GeminiClient::analyze_risks`] | pro, JSON schema | list of [`RiskResponse`] |
//! | [`GeminiClient::generate_report`] | pro | markdown |
//!
//! Structured outputs are decoded into the loose boundary types from
//! `nexus_core::plan`; turning them into domain values is the caller's job.
//!
//! ```rust,ignore
//! use gemini_agent::{GeminiClient, PlanInput};
//!
//! let client = GeminiClient::from_config(&config.ai)?;
//! let plan = client
//!     .parse_plan(PlanInput::Text("A bakery web shop".into()), &team, today)
//!     .await?;
//! ```

pub mod client;
pub mod error;
pub mod prompts;
pub mod types;


pub use client::{GeminiClient, PlanInput};
pub use error::GeminiError;
pub use nexus_core::plan::{PlanResponse, RiskResponse};

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, GeminiError>;
