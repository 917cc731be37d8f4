//! Pacing core for rapid serial visual presentation.
//!
//! [`clock::PacingClock`] advances a word cursor in real time, [`ramp`] turns a ramp
//! configuration into the rate that governs it, and [`estimate`] predicts how long the
//! rest of the text will take. [`app::ReaderSession`] ties them to one poll loop.

pub mod app;
pub mod clock;
pub mod estimate;
pub mod ramp;
pub mod rate;
pub mod settings;
pub mod text;
pub mod text_policy;
