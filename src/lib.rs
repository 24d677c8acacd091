pub mod calendar;
pub mod config;
pub mod dispatch;
pub mod layout;
pub mod limits;
pub mod maintenance;
pub mod model;
pub mod notify;
pub mod observability;
pub mod store;
pub mod wal;
