// SPDX-License-Identifier: GPL-3.0-only

//! Backend abstraction layer for camera devices
//!
//! The backend layer hides which device API is driven, providing a consistent
//! API regardless of the underlying camera subsystem:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │               Camera facade                  │
//! └────────────────────┬────────────────────────┘
//!                      │
//! ┌────────────────────┴────────────────────────┐
//! │              Backend Layer                   │
//! │  ┌─────────────┐    ┌──────────────────┐    │
//! │  │   Legacy    │    │      Modern      │    │
//! │  │ (sync API)  │    │   (async API)    │    │
//! │  └─────────────┘    └──────────────────┘    │
//! │            ┌──────────────────┐              │
//! │            │    Simulated     │              │
//! │            │  (both APIs)     │              │
//! │            └──────────────────┘              │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`camera`]: Backend trait, session driver and both device API backends

pub mod camera;

pub use camera::simulated;
