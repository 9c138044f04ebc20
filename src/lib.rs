//! Analytic core for a topical steroid withdrawal (TSW) check-in tracker.
//!
//! Takes the user's check-in history — skin ratings, symptoms, triggers,
//! treatments — and derives the signals the app surfaces: a flare-state
//! classification per day, food/product reaction scores, and a weekly
//! "what helped" correlation. Everything is a pure function of the
//! check-in slice at call time: no I/O, no persistence, no incremental
//! state, cheap enough to recompute wholesale whenever the store changes.
//!
//! Persistence/sync, UI rendering, and the LLM coach that consumes the
//! summary lines are external collaborators; this crate only reads the
//! records they hand it.

pub mod config;
pub mod error;
pub mod models;
pub mod aggregate;
pub mod flare; // daily burden, baseline, episodes, current state
pub mod reactions; // food/product exposure outcomes
pub mod improvements; // weekly "what helped" correlation
pub mod summary; // coach-context lines + symptom overview
pub mod engine;

pub use engine::{build_insight_report, InsightReport};
pub use error::InsightError;
pub use models::{CheckIn, RawCheckIn};
