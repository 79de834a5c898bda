pub mod auth;
pub mod extraction;
