pub mod api_log;
pub mod header;
pub mod question;
