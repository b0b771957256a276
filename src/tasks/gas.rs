// Smart Node — Gas Task
//
// Owns every MQ channel.  Calibrates each one in clean air at startup (about
// ten seconds per channel), then estimates all concentrations every
// `GAS_INTERVAL_MS`.  A channel whose calibration failed keeps reporting
// `NotCalibrated` in the log; the others carry on.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use embedded_hal::delay::DelayNs;

use crate::config::*;
use crate::drivers::mq::{AnalogInput, MqSensor};
use crate::events::Measurement;

pub fn gas_task<A: AnalogInput, D: DelayNs>(
    mut sensors: Vec<MqSensor<A>>,
    mut delay: D,
    tx: Sender<Measurement>,
) {
    log::info!("Gas task started");

    let calibrated = calibrate_all(&mut sensors, &mut delay, CALIBRATION_SAMPLES, CALIBRATION_INTERVAL_MS);
    if calibrated < sensors.len() {
        log::error!("{} of {} gas channels failed calibration", sensors.len() - calibrated, sensors.len());
    }

    let interval = Duration::from_millis(GAS_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        if !sample_all(&mut sensors, &tx) {
            log::warn!("Measurement channel closed — exiting gas task");
            return;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

/// Calibrate every channel in turn.  Returns how many succeeded.
pub fn calibrate_all<A: AnalogInput>(
    sensors: &mut [MqSensor<A>],
    delay: &mut impl DelayNs,
    samples: usize,
    interval_ms: u32,
) -> usize {
    let mut ok = 0;
    for sensor in sensors.iter_mut() {
        match sensor.calibrate_baseline(delay, samples, interval_ms) {
            Ok(_) => ok += 1,
            Err(e) => log::error!("{} calibration failed: {}", sensor.model().name, e),
        }
    }
    ok
}

/// Read every channel once.  A failed channel reports `GasUnavailable` so
/// the reporter drops its previous value.  Returns `false` only when the
/// channel is closed.
pub fn sample_all<A: AnalogInput>(sensors: &mut [MqSensor<A>], tx: &Sender<Measurement>) -> bool {
    for sensor in sensors.iter_mut() {
        let model = *sensor.model();
        let measurement = match sensor.read() {
            Ok(reading) => Measurement::Gas(model.kind, reading),
            Err(e) => {
                log::warn!("{} read error: {}", model.name, e);
                Measurement::GasUnavailable(model.kind)
            }
        };
        if tx.send(measurement).is_err() {
            return false;
        }
    }
    true
}
