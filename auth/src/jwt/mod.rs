mod errors;
mod handler;

pub use errors::JwtError;
pub use handler::JwtHandler;
