// Smart Node — Humidity Task
//
// Reads the DHT11 every `HUMIDITY_INTERVAL_MS`.  A failed read is forwarded
// as `Humidity(None)` so the report drops the old value.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::dht11::HumiditySensor;
use crate::events::Measurement;

pub fn humidity_task<H: HumiditySensor>(mut sensor: H, tx: Sender<Measurement>) {
    log::info!("Humidity task started (DHT11 GPIO{})", PIN_DHT11);

    let interval = Duration::from_millis(HUMIDITY_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        if !sample(&mut sensor, &tx) {
            log::warn!("Measurement channel closed — exiting humidity task");
            return;
        }

        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}

/// One read.  Returns `false` only when the channel is closed.
pub fn sample<H: HumiditySensor>(sensor: &mut H, tx: &Sender<Measurement>) -> bool {
    let humidity = match sensor.read_humidity() {
        Ok(rh) => {
            log::debug!("DHT11: {:.1} %", rh);
            Some(rh)
        }
        Err(e) => {
            log::warn!("DHT11 read failed: {}", e);
            None
        }
    };
    tx.send(Measurement::Humidity(humidity)).is_ok()
}
