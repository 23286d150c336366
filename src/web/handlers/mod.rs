//! HTTP request handlers organized by domain

pub mod channels;
pub mod health;
pub mod index;
pub mod proxy;
