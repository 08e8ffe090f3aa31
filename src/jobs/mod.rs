pub mod supervisor;
pub mod market_poll;
pub mod session_sync;
