//! Status Bot Library
//!
//! A Telegram bot that reports host metrics and lets its owner broadcast
//! messages to opted-in users.
//!
//! This crate provides the core functionality for:
//! - Tracking subscribers in a lock-guarded in-memory registry
//! - Pacing owner broadcasts and dropping unreachable subscribers
//! - Collecting and formatting system metrics
//! - Looking up YouTube audio streams
//! - Handling user commands via chat messages

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod metrics;
pub mod subscribers;
pub mod telegram;
pub mod youtube;
