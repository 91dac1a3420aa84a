//! Coaching core: live game-state normalization, agent prompting, reference
//! build data, and model dispatch.
//!
//! The front-end binary drives `session::CoachSession`; everything below it
//! is plain library code callable from any scheduling context.

pub mod agent;
pub mod builds;
pub mod config;
pub mod game;
pub mod llm;
pub mod session;
