pub mod auth;
pub mod bag;
pub mod error;
pub mod health;
pub mod pages;
pub mod static_files;
