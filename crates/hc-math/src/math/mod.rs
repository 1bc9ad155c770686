//! Core math modules.

pub mod dirichlet;
pub mod probability;
pub mod stable;
