// Smart Node — DHT11 Humidity Driver
//
// Single-wire humidity/temperature sensor.  Only the humidity is used; the
// BMP180 is the better thermometer.  The bit-level protocol is handled by the
// `dht11` crate on the device.

use crate::error::{Error, Result};

/// Anything that can report relative humidity in percent.
pub trait HumiditySensor {
    fn read_humidity(&mut self) -> Result<f32>;
}

/// Convert the sensor's tenths-of-a-percent value, rejecting anything above
/// 100 % (a corrupt frame that still passed the checksum).
pub fn humidity_from_tenths(tenths: u16) -> Result<f32> {
    if tenths > 1000 {
        return Err(Error::InvalidInput("humidity above 100 %"));
    }
    Ok(f32::from(tenths) / 10.0)
}

#[cfg(target_os = "espidf")]
pub use device::Dht11Sensor;

#[cfg(target_os = "espidf")]
mod device {
    use ::dht11::Dht11;
    use esp_idf_hal::delay::{Ets, FreeRtos};
    use esp_idf_hal::gpio::{AnyIOPin, InputOutput, PinDriver};

    use super::{humidity_from_tenths, HumiditySensor};
    use crate::error::{Error, Result};

    pub struct Dht11Sensor<'d> {
        device: Dht11<PinDriver<'d, AnyIOPin, InputOutput>>,
    }

    impl<'d> Dht11Sensor<'d> {
        pub fn new(pin: PinDriver<'d, AnyIOPin, InputOutput>) -> Self {
            Self {
                device: Dht11::new(pin),
            }
        }
    }

    impl HumiditySensor for Dht11Sensor<'_> {
        fn read_humidity(&mut self) -> Result<f32> {
            // Let the line settle high before the start pulse.
            FreeRtos::delay_ms(10);

            let measurement = self.device.perform_measurement(&mut Ets).map_err(|e| match e {
                ::dht11::Error::Timeout => Error::Dht11("timeout"),
                ::dht11::Error::CrcMismatch => Error::Dht11("checksum mismatch"),
                ::dht11::Error::Gpio(_) => Error::Dht11("gpio"),
            })?;
            humidity_from_tenths(measurement.humidity)
        }
    }
}
