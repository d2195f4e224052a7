//! Derived-metrics core: pure functions from readings to metric bundles.

pub mod aggregate;
pub mod classify;
pub mod index;
pub mod series;
pub mod types;
