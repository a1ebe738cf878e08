pub mod accelerators;
pub mod find;
pub mod run;
pub mod validate;
