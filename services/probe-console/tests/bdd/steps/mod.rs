//! BDD step definitions for probe-console

pub mod bulk_steps;
pub mod directory_steps;
