// Smart Node — Driver Errors

use embedded_hal::i2c::ErrorKind;

/// Failures reported by the sensor drivers.
///
/// Transport faults are transient: the caller may simply try again on the
/// next polling cycle.  Everything else points at bad input or a driver used
/// before it was calibrated.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("I2C transfer failed: {0:?}")]
    I2c(ErrorKind),

    #[error("ADC read failed (esp_err_t {0})")]
    Adc(i32),

    #[error("DHT11 read failed: {0}")]
    Dht11(&'static str),

    #[error("calibration block holds {0} bytes, 22 required")]
    ShortCalibration(usize),

    #[error("calibration word {index} reads {raw:#06x}")]
    InvalidCalibration { index: usize, raw: u16 },

    #[error("invalid numeric input: {0}")]
    InvalidInput(&'static str),

    #[error("sensor used before calibration")]
    NotCalibrated,

    #[error("oversampling setting {0} out of range 0..=3")]
    InvalidOversampling(u8),
}

impl Error {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::I2c(_) | Self::Adc(_) | Self::Dht11(_))
    }
}

pub type Result<T> = core::result::Result<T, Error>;
