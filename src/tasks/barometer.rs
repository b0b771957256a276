// Smart Node — Barometer Task
//
// Owns the BMP180.  Loads its calibration once, then measures temperature
// and pressure every `CLIMATE_INTERVAL_MS` and pushes the result into the
// measurement channel for the reporter task.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use crate::config::*;
use crate::drivers::bmp180::{Bmp180, Oversampling};
use crate::events::Measurement;

pub fn barometer_task<I2C: I2c, D: DelayNs>(mut sensor: Bmp180<I2C, D>, tx: Sender<Measurement>) {
    log::info!("Barometer task started");

    if !sensor.is_connected() {
        log::warn!("BMP180 chip id mismatch at {:#04x}", I2C_ADDR_BMP180);
    }
    if let Err(e) = sensor.init() {
        log::error!("BMP180 init failed in barometer task: {}", e);
        return;
    }

    let interval = Duration::from_millis(CLIMATE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        if !sample(&mut sensor, BAROMETER_OVERSAMPLING, &tx) {
            // Receiver dropped — reporter task has exited. Shut down cleanly.
            log::warn!("Measurement channel closed — exiting barometer task");
            return;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

/// One measurement cycle.  A failed read is logged and skipped; returns
/// `false` only when the channel is closed.
pub fn sample<I2C: I2c, D: DelayNs>(
    sensor: &mut Bmp180<I2C, D>,
    oss: Oversampling,
    tx: &Sender<Measurement>,
) -> bool {
    match sensor.measure(oss) {
        Ok(reading) => {
            log::debug!(
                "BMP180: {:.1} °C, {:.2} hPa",
                reading.temperature_c,
                reading.pressure_hpa()
            );
            tx.send(Measurement::Climate(reading)).is_ok()
        }
        Err(e) => {
            log::warn!("BMP180 read error: {}", e);
            true
        }
    }
}
