pub mod admissions;
pub mod auth;
pub mod health;
pub mod records;
pub mod reports;
pub mod tasks;
pub mod uploads;
pub mod users;
pub mod visits;
