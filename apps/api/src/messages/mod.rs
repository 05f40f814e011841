pub mod conversation;
pub mod handlers;
