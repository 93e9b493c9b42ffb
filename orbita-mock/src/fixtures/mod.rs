pub mod scenes;
pub mod statistics;
