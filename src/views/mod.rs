//! View composers. Each view is assembled from the poller's snapshot and the
//! reconciler's bookmark set; none of them talk to the network on their own
//! except through the reconciler or the admin roster client.

pub mod admin;
pub mod compare;
pub mod detail;
pub mod listing;
pub mod user_panel;
