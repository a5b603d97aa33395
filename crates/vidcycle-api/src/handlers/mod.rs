//! HTTP handlers for vidcycle-api.

pub mod admin;
pub mod classify;
pub mod cron;
pub mod health;
pub mod labels;
pub mod videos;
