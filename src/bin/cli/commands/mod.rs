pub mod account;
pub mod image;
