pub mod auth;
pub mod distributor;
pub mod funnel;
pub mod intake;
