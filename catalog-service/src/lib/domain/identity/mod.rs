pub mod access;
pub mod errors;
pub mod models;
pub mod ports;
pub mod resolver;
pub mod service;
pub mod token;
pub mod users;
