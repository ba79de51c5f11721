pub mod preprocessing;
pub mod labeling;
pub mod extraction;
pub mod tour;
pub mod decimation;

pub use preprocessing::*;
pub use labeling::*;
pub use extraction::*;
pub use tour::*;
pub use decimation::*;
