//! Boundary between the network layer and the world engine: typed requests, broadcast records,
//! settings, and the lock that serializes every mutation.

pub use config::*;
pub use error::*;
pub use messages::*;
pub use shared::*;

pub use vastsweeper_core::{Cell, Coord, Coord2, WorldError};

mod config;
mod error;
mod messages;
mod shared;
