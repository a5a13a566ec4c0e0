//! Solvers that do not need shared Cooley-Tukey scaffolding.

pub mod direct;
pub mod rank_geq2;
