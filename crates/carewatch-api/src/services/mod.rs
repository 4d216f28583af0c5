// Services backing the HTTP routes

mod alert_log;

pub use alert_log::AlertLogService;
