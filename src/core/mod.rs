pub mod chat_stream;
pub mod message;
pub mod models;
pub mod schema;
pub mod session;
