pub mod coin;
pub mod mode;
pub mod rules;
