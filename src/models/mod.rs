pub mod auth;
pub mod post;
pub mod settings;
pub mod user;
