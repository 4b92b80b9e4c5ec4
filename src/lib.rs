//! Nutribot - WhatsApp nutrition assistant
//!
//! Receives WhatsApp messages through Twilio or the WhatsApp Cloud API,
//! walks each user through a short diet-aware conversation, and answers food
//! questions (text or photos) with a vision-capable completion model.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
