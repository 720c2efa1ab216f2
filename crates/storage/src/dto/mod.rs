pub mod common;
pub mod points;
pub mod reserves;
pub mod results;
pub mod stage;
pub mod standings;
