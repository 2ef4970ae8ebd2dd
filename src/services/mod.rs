pub mod ai_service;
pub mod export_service;
pub mod header_matcher;
pub mod key_service;
pub mod log_service;
pub mod prompt_service;
