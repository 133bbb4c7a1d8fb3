pub mod bag;
pub mod dashboard;
pub mod memory_bag;
pub mod postgres_repository;
pub mod product;
pub mod user;
