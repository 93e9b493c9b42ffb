pub mod search;
pub mod statistics;

pub mod util;
