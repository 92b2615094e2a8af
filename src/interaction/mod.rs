//! Pointer interaction tracking for the virtual controller
//!
//! Implements the interactive input core in two parts:
//!
//! 1. [`tracker`] - Per-pointer capture state machine (start/move/end)
//! 2. [`polar`] - Pointer offset to normalized stick axes conversion
//!
//! # Architecture
//!
//! ```text
//! Pointer events ──► InteractionTracker ──► Interaction set ──► Message synthesis
//!  (start/move/end)   (capture registry)     (per live contact)
//! ```
//!
//! The tracker itself is the capture registry: once a pointer id is bound at
//! contact-start, every later event for that id is routed to the same
//! interaction regardless of screen position, until contact-end. The UI layer
//! feeds raw platform events in; nothing here touches a platform pointer API.

pub mod polar;
pub mod tracker;

pub use polar::{stick_axes, STICK_TRAVEL_UNITS};
pub use tracker::{ContactBinding, Interaction, InteractionTracker, PointerId};
