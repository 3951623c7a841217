#![forbid(unsafe_code)]

//! Label resolution for secnav.
//!
//! Provides the [`LabelResolver`] seam the navigator calls to turn a
//! section's label key into display text, plus [`StringCatalog`], an
//! in-memory implementation with locale fallback chains and `{name}`
//! interpolation.
//!
//! # How it fits in the system
//! The runtime treats the resolver as a synchronous black box. Switching the
//! catalog's locale changes tab text, which the embedding reports to the
//! navigator as a layout change so the indicator is re-measured.

pub mod catalog;

pub use catalog::{I18nError, LabelResolver, LocaleStrings, StringCatalog};
