pub mod admin;
pub mod carts;
pub mod catalog;
