//! Core data models for shift analytics.

mod distribution;
mod ids;
mod shift;
mod view;

pub use distribution::*;
pub use ids::*;
pub use shift::*;
pub use view::*;
