pub mod barometer;
pub mod gas;
pub mod humidity;
pub mod input;
pub mod reporter;
