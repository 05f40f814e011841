pub mod dates;
pub mod handlers;
pub mod queries;
pub mod ranking;
