//! Card content built on the engine.
//!
//! Each faction lives in its own module and exposes its card definitions
//! and a ready-made `Deck`.

pub mod dinosaurs;
