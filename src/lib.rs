//! Core War battle engine.
//!
//! Provides the MARS virtual machine, the Redcode assembler, and the battle
//! manager that pits warriors against each other in a shared circular core.

pub mod battle;
pub mod loader;
pub mod mars;
pub mod utils;
pub mod warrior;
