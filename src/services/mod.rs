pub mod mail_service;
pub mod page_service;
pub mod trigger_service;
