pub mod event;
pub mod message;
pub mod profile;
pub mod user;
