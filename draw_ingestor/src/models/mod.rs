pub mod date_range;
pub mod draw;
pub mod statistics;
