//! Core types and constants for the Zephyr Protocol reserve.
//!
//! Network configuration, hard-fork schedules, asset and transaction type
//! definitions, and atomic-amount helpers shared by every other crate.

pub mod constants;
