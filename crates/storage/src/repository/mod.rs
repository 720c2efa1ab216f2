pub mod participant;
pub mod points;
pub mod results;
pub mod roster;
pub mod scoring_rule;
pub mod stage;
