pub mod points;
pub mod reserves;
pub mod stages;
pub mod standings;
