#![forbid(unsafe_code)]

//! Deterministic fixtures for secnav scenario tests.
//!
//! - [`SimulatedPage`]: layout, smooth scrolling, an intersection-observer
//!   emulation, session history, tabs, and timers behind the host traits.
//! - [`Rig`]: mounts a navigator on a page and drives it frame by frame.
//! - [`Transcript`]: the JSONL record of a run, with a blake3 checksum for
//!   replay comparisons.
//!
//! Nothing here reads the wall clock; identical scenarios produce identical
//! transcripts.

pub mod page;
pub mod rig;
pub mod transcript;

pub use page::{DEFAULT_VIEWPORT, FrameReport, ScrollRequest, SectionSpec, SimulatedPage};
pub use rig::{FRAME, Rig};
pub use transcript::Transcript;
