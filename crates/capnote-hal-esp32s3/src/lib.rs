//! ESP32-S3 board bindings for the capnote firmware: microphone capture,
//! touch-button scanning, the status LED, and network configuration. All
//! device behavior lives in `capnote-core`; this crate only adapts it to
//! the board peripherals.

#![no_std]

pub mod input;
pub mod led;
pub mod mic;
pub mod network;
