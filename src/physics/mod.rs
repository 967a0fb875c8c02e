//! Physics simulation module
//!
//! Built on top of rapier3d

mod world;

pub use world::{BALL_COUNT, TableDimensions, TablePhysics};
