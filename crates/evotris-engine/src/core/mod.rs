//! Board and piece geometry.

pub use self::{grid::*, piece::*};

pub(crate) mod grid;
pub(crate) mod piece;

pub(crate) const GRID_WIDTH: usize = 10;
pub(crate) const GRID_HEIGHT: usize = 20;
