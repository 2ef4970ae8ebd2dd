pub mod assistant;
pub mod export;
pub mod generation;
pub mod health;
pub mod settings;
