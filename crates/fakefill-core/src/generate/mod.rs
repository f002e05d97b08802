pub mod engine;
pub mod providers;
pub mod value;
