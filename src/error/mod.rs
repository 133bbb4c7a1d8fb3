pub mod app_error;
pub mod json;
pub mod page;
