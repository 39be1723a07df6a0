//! Non-interactive qlab commands

pub mod catalog;
pub mod estimate;
pub mod health;
pub mod results;
