pub mod api_log;
