//! Layout calculation modules for imposition
//!
//! This module handles all the geometric calculations for page imposition:
//! - Canonical sheet grids for the fixed-layout formats
//! - Booklet and flipbook page ordering
//! - Resolving a template into printed sheet sides

mod grid;
mod resolve;
mod signature;
mod types;

pub use grid::*;
pub use resolve::*;
pub use signature::*;
pub use types::*;
