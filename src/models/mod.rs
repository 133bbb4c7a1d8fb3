pub mod bag;
pub mod dashboard;
pub mod product;
pub mod user;
