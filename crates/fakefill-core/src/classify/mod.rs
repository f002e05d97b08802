pub mod rules;
pub mod semantic;
