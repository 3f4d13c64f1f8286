pub mod cold_start;
pub mod dispatch;
pub mod formatter;
pub mod ranking;
pub mod rating_store;
pub mod recommendations;
pub mod session;
pub mod svdpp;
