//! Device logic for the capnote meeting-capture firmware.
//!
//! Everything in this crate is host-testable: timing enters as `now_ms`
//! arguments and hardware sits behind small traits; the firmware binary
//! wires the pieces onto the board.

#![cfg_attr(not(test), no_std)]

pub mod app;
pub mod audio;
pub mod connectivity;
pub mod indicator;
pub mod input;
