pub mod asset;
pub mod bookmark;
pub mod comparison;
pub mod historical;
pub mod session;
pub mod user;
