pub mod extractor;
pub mod handlers;
pub mod password;
pub mod revocation;
pub mod token;

pub use extractor::AuthUser;
