//! # relayhub-domain
//!
//! Pure domain model for the relayhub relay timer.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Devices** (relays with a pin, a polarity and a display label)
//! - Define **Operations** (one-shot countdowns and on/off duty-cycle loops)
//! - Define **Device state** (the per-device record a running operation mutates)
//! - Project device state into client-facing **status snapshots**
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod device_state;
pub mod operation;
pub mod status;
