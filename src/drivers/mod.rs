pub mod bmp180;
pub mod dht11;
pub mod led;
pub mod mq;

#[cfg(target_os = "espidf")]
pub mod adc;
