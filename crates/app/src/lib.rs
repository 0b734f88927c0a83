//! # relayhub-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define the **port trait** adapters must implement (driven/outbound port):
//!   - `RelayEffector` — open or close a relay
//! - Own the shared, lock-guarded **device state table** (`DeviceStateStore`)
//! - Run timed operations (`TimingEngine`): countdowns and duty-cycle loops
//!   ticking at a fixed interval, observing a per-run cancellation token
//! - Define the **driving/inbound port** as a use-case struct:
//!   - `RelayService` — validate, reject busy devices, spawn runs, report status
//!
//! ## Dependency rule
//! Depends on `relayhub-domain` only (plus `tokio` for tasks, timers and
//! channels). Never imports adapter crates. Adapters depend on *this* crate,
//! not the reverse.

pub mod cancel;
pub mod ports;
pub mod services;
pub mod state_store;
pub mod timing_engine;
