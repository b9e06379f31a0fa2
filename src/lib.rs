#![deny(missing_docs)]
//! OTP relay bot library.
//!
//! Polls an SMS-provisioning API for inbound messages, extracts one-time
//! passcodes and relays them to a Telegram group.

/// Telegram bot surface: commands, notifications, formatting.
pub mod bot;
/// Configuration management.
pub mod config;
/// OTP extraction from message bodies.
pub mod otp;
/// The fixed-interval poll loop.
pub mod poller;
/// SMS-provisioning API client.
pub mod provider;
