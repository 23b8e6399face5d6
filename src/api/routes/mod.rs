pub mod predict;
pub mod refresh;
pub mod shifts;
