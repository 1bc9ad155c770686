//! HMM complexity math utilities.

pub mod math;

pub use math::dirichlet;
pub use math::probability::*;
pub use math::stable::*;
