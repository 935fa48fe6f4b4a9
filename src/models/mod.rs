pub mod hierarchy;
pub mod question;
pub mod region;

pub use hierarchy::{Placement, RegionHierarchy};
pub use question::{Question, SubQuestion};
pub use region::{Point, Region};
