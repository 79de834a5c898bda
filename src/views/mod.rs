pub mod admin;
pub mod books;
pub mod components;
pub mod homepage;
pub mod layout;
pub mod play;

pub use layout::{error_page, page, render, titled};
