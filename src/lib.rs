//! # vitrack - session layer for visual-inertial tracking cameras
//!
//! Drives a 6DOF tracking camera session end to end:
//! - device discovery, option configuration, streaming lifecycle
//! - native pose stream converted to the standard robotics frame
//!   convention (pose, child-frame twist, confidence-scaled covariance)
//! - spatial map save/load with a fixed relocalization anchor
//! - relocalization event monitoring
//!
//! The concrete sensor driver is abstracted behind [`driver::TrackingDriver`];
//! the crate ships a simulated driver ([`sim::SimDriver`]) for tests and
//! demos.
//!
//! ## Quick Start
//! ```no_run
//! use vitrack::sim::SimDriver;
//! use vitrack::{SessionConfig, SessionController};
//!
//! let driver = SimDriver::new();
//! let (mut controller, messages) =
//!     SessionController::new(Box::new(driver), SessionConfig::default());
//! controller.configure().unwrap();
//! controller.start().unwrap();
//! for msg in messages.iter().take(10) {
//!     println!("{:?}", msg);
//! }
//! ```

pub mod config;
pub mod driver;
pub mod error;
pub mod map_store;
pub mod session;
pub mod sim;
pub mod transform;
pub mod types;

mod dispatch;

pub use config::{ParamUpdate, SessionConfig};
pub use error::VitrackError;
pub use session::{ConfigHandle, SessionController, SessionState, MAP_ANCHOR_GUID};
pub use types::*;

/// Result type alias for vitrack operations.
pub type Result<T> = std::result::Result<T, VitrackError>;
