// src/models.rs

pub mod billing;
pub mod company;
pub mod device;
pub mod identity;
