//! AURA Radius Engine - the adaptive aura around every user
//!
//! This crate implements the elastic radius control loop:
//! - Per-user aura state (radius, density, trend)
//! - Band-driven contraction and expansion with exponential smoothing
//! - Tunneling fallback when nothing is reachable at maximum radius
//! - Idle-state expiry

pub mod aura;
pub mod controller;

pub use aura::*;
pub use controller::*;
