//! Intake Interview — scripted conversational intake with an upsell reveal.

pub mod cli;
pub mod config;
pub mod error;
pub mod interview;
