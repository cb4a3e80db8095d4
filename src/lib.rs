// SPDX-License-Identifier: GPL-3.0-only

//! camhal - camera hardware abstraction with preview geometry
//!
//! One interface over two incompatible camera subsystems: a legacy
//! synchronous API with enumerated zoom levels and a normalized focus space,
//! and a modern asynchronous API with crop regions and active-array focus
//! coordinates. The geometry engine keeps preview, touch-to-focus and zoom
//! consistent across sensor orientation, display rotation and view aspect
//! ratio.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`camera`]: Builder and facade applications talk to
//! - [`backends`]: Backend trait, session state machine, device APIs
//! - [`config`]: Per-session configuration validated against capabilities
//! - [`geometry`]: Pure orientation, scaling, focus and zoom math
//! - [`dispatch`]: Callback queue and delivery modes
//! - [`settings`]: Integration defaults persisted as JSON
//!
//! # Example
//!
//! ```no_run
//! use camhal::backends::simulated::SimulatedPlatform;
//! use camhal::camera::Camera;
//! use std::sync::Arc;
//!
//! let camera = Camera::builder(Arc::new(SimulatedPlatform::phone()))
//!     .advanced_features(true)
//!     .build()?;
//! for descriptor in camera.available_cameras() {
//!     println!("{}", descriptor);
//! }
//! # Ok::<(), camhal::errors::CameraError>(())
//! ```

pub mod backends;
pub mod camera;
pub mod config;
pub mod constants;
pub mod dispatch;
pub mod errors;
pub mod geometry;
pub mod picture;
pub mod settings;

// Re-export commonly used types
pub use camera::{Camera, CameraBuilder};
pub use config::{CameraConfig, ConfigSnapshot};
pub use constants::BitratePreset;
pub use dispatch::DeliveryMode;
pub use errors::{CameraError, HalResult};
pub use settings::Settings;
