//! Domain logic for the signage media service.
//!
//! This crate has zero internal dependencies so the scheduling rules can be
//! shared by the repository layer, the HTTP layer, and the playback engine.

pub mod error;
pub mod media;
pub mod scheduling;
pub mod sequencer;
pub mod serde_helpers;
pub mod types;
