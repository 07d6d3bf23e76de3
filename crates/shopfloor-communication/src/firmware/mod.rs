//! Firmware protocol support
//!
//! The fleet runs FluidNC, which speaks the Grbl-compatible line protocol:
//! single-character realtime commands (`?`, `!`), `$`-prefixed system
//! commands, and angle-bracketed status reports. Formatting and parsing for
//! that protocol lives here; everything is pure and transport-agnostic.

pub mod fluidnc;
