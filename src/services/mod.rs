pub mod analytics;
pub mod difficulty;
pub mod quality;
pub mod session_builder;
pub mod sm2;
