//! Pure reshaping of surveillance records for presentation.
//!
//! This module turns the raw weekly records into parallel chart sequences
//! and a summary snapshot, and computes the lookback window the records are
//! requested for.

pub mod aggregate;
pub mod types;
pub mod window;
