// src/handlers.rs

pub mod billing;
pub mod companies;
pub mod devices;
pub mod subscriptions;
pub mod users;
