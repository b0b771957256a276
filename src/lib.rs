// Smart Node — environmental monitor for ESP32.
//
// BMP180 temperature/pressure, MQ-135/MQ-5/MQ-9 gas estimates, PIR motion
// and a latching safety alert.  Everything except the ADC wrapper builds on
// the host so the drivers and tasks can be unit tested there.

pub mod alert;
pub mod config;
pub mod drivers;
pub mod error;
pub mod events;
pub mod input;
pub mod report;
pub mod tasks;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
