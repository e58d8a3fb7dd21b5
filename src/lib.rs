//! Polar alignment in rust
//!
//! Finds where a mount's RA axis points from two plate solved images taken
//! before and after rotating the mount, and tells how far and which way it
//! has to move to reach the celestial pole.

pub mod alignment;
pub mod axis;
pub mod common;
pub mod config;
pub mod error;
pub mod gate;
pub mod header;
pub mod math;
pub mod pipeline;
pub mod pole;
pub mod region;
pub mod solution;
pub mod wcs;

pub use alignment::{compute_error, AlignmentResult};
pub use axis::{locate_axis, locate_axis_single, AxisFix, Broyden, RootFinder};
pub use config::AlignConfig;
pub use error::{AlignError, AxisError};
pub use gate::Hemisphere;
pub use header::Header;
pub use math::PixelPoint;
pub use pipeline::{AlignmentPipeline, AlignmentReport};
pub use region::annotation_region;
pub use solution::PlateSolution;
pub use wcs::{CoordinateTransform, TanTransform};
