pub mod handlers;
pub mod ownership;
pub mod session;
pub mod users;
