// Runtime wiring for the headless bot.

pub mod bot;
pub mod config;
