// Smart Node — Reporter Task
//
// Consumes every measurement, keeps the latest-value snapshot, drives the
// safety monitor and the status LEDs, and emits a report every
// `REPORT_INTERVAL_MS`: a status line on the log, an MQTT JSON body, and a
// ThingSpeak update on every `THINGSPEAK_EVERY`th report.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use crate::alert::{AlertIndicator, AlertState, SafetyMonitor};
use crate::config::*;
use crate::events::Measurement;
use crate::report::{Outbound, ReportSink, Snapshot};

pub struct Reporter<S, L> {
    snapshot: Snapshot,
    monitor: SafetyMonitor,
    sink: S,
    indicator: L,
    reports: u32,
    thingspeak_key: Option<&'static str>,
}

impl<S: ReportSink, L: AlertIndicator> Reporter<S, L> {
    pub fn new(
        sink: S,
        mut indicator: L,
        threshold_ppm: f32,
        thingspeak_key: Option<&'static str>,
    ) -> Self {
        let monitor = SafetyMonitor::new(threshold_ppm);
        indicator.show(monitor.state());
        Self {
            snapshot: Snapshot::default(),
            monitor,
            sink,
            indicator,
            reports: 0,
            thingspeak_key,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn apply(&mut self, measurement: Measurement) {
        let changed = match measurement {
            Measurement::ButtonPressed => self.monitor.acknowledge(),
            Measurement::Climate(reading) => {
                self.snapshot.climate = Some(reading);
                None
            }
            Measurement::Humidity(rh) => {
                self.snapshot.humidity = rh;
                None
            }
            Measurement::Gas(kind, reading) => {
                *self.snapshot.gas_mut(kind) = Some(reading.ppm);
                self.evaluate()
            }
            // Stale value: drop it from reports and alarm checks.
            Measurement::GasUnavailable(kind) => {
                *self.snapshot.gas_mut(kind) = None;
                None
            }
            Measurement::Motion(level) => {
                self.snapshot.motion = level;
                self.evaluate()
            }
        };

        if let Some(state) = changed {
            self.indicator.show(state);
        }
        self.snapshot.alert = self.monitor.state();
    }

    fn evaluate(&mut self) -> Option<AlertState> {
        self.monitor.evaluate(self.snapshot.co2_ppm, self.snapshot.motion)
    }

    /// Emit one report.  Transport errors are logged and do not stop the task.
    pub fn publish(&mut self) {
        self.reports = self.reports.wrapping_add(1);
        log::info!("{}", self.snapshot.status_line());

        match Outbound::mqtt(&self.snapshot) {
            Ok(message) => {
                if let Err(e) = self.sink.send(&message) {
                    log::warn!("MQTT publish failed: {:#}", e);
                }
            }
            Err(e) => log::error!("Payload encoding failed: {:#}", e),
        }

        if let Some(key) = self.thingspeak_key {
            if self.reports % THINGSPEAK_EVERY == 0 {
                let message = Outbound::Get {
                    url: self.snapshot.thingspeak_url(key),
                };
                if let Err(e) = self.sink.send(&message) {
                    log::warn!("ThingSpeak update failed: {:#}", e);
                }
            }
        }
    }
}

pub fn reporter_task<S: ReportSink, L: AlertIndicator>(
    rx: Receiver<Measurement>,
    mut reporter: Reporter<S, L>,
    interval: Duration,
) {
    log::info!("Reporter task started");

    let mut next_report = Instant::now() + interval;

    loop {
        let wait = next_report.saturating_duration_since(Instant::now());
        match rx.recv_timeout(wait) {
            Ok(measurement) => reporter.apply(measurement),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("All producers gone — exiting reporter task");
                return;
            }
        }

        let now = Instant::now();
        if now >= next_report {
            reporter.publish();
            next_report = next_deadline(next_report, now, interval);
        }
    }
}

/// Next report slot after the one due at `due`.  Slots missed while the task
/// was stalled are skipped rather than replayed back to back.
fn next_deadline(due: Instant, now: Instant, interval: Duration) -> Instant {
    let next = due + interval;
    if next <= now {
        now + interval
    } else {
        next
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::drivers::bmp180::CompensatedReading;
    use crate::drivers::mq::MqSensor;
    use crate::events::{GasKind, GasReading};
    use crate::tasks::gas;
    use crate::testing::{RecordingDelay, RecordingIndicator, RecordingSink, ScriptedAdc};

    fn gas(ppm: f32) -> Measurement {
        Measurement::Gas(
            GasKind::Co2,
            GasReading {
                millivolts: 400.0,
                resistance_ohms: 100_000.0,
                ppm,
            },
        )
    }

    fn reporter(
        key: Option<&'static str>,
    ) -> (Reporter<RecordingSink, RecordingIndicator>, RecordingSink, RecordingIndicator) {
        let sink = RecordingSink::default();
        let leds = RecordingIndicator::default();
        (Reporter::new(sink.clone(), leds.clone(), 800.0, key), sink, leds)
    }

    #[test]
    fn starts_safe() {
        let (_r, _sink, leds) = reporter(None);
        assert_eq!(leds.history(), vec![AlertState::Safe]);
    }

    #[test]
    fn danger_latches_until_button() {
        let (mut r, _sink, leds) = reporter(None);
        r.apply(Measurement::Motion(true));
        r.apply(gas(1200.0));
        assert_eq!(r.snapshot().alert, AlertState::Danger);

        r.apply(gas(300.0));
        r.apply(Measurement::Motion(false));
        assert_eq!(r.snapshot().alert, AlertState::Danger);

        r.apply(Measurement::ButtonPressed);
        assert_eq!(r.snapshot().alert, AlertState::Safe);
        assert_eq!(
            leds.history(),
            vec![AlertState::Safe, AlertState::Danger, AlertState::Safe]
        );
    }

    #[test]
    fn high_gas_without_motion_stays_safe() {
        let (mut r, _sink, _leds) = reporter(None);
        r.apply(gas(5000.0));
        assert_eq!(r.snapshot().alert, AlertState::Safe);
    }

    #[test]
    fn failed_channel_clears_its_value() {
        let (mut r, _sink, _leds) = reporter(None);
        r.apply(gas(1567.0));
        r.apply(Measurement::GasUnavailable(GasKind::Co2));
        assert_eq!(r.snapshot().co2_ppm, None);

        r.apply(Measurement::Motion(true));
        assert_eq!(r.snapshot().alert, AlertState::Safe);
    }

    #[test]
    fn failed_humidity_read_clears_it() {
        let (mut r, _sink, _leds) = reporter(None);
        r.apply(Measurement::Humidity(Some(48.0)));
        assert_eq!(r.snapshot().humidity, Some(48.0));
        r.apply(Measurement::Humidity(None));
        assert_eq!(r.snapshot().humidity, None);
    }

    #[test]
    fn rising_gas_from_calibrated_sensor_raises_alert() {
        let sink = RecordingSink::default();
        let leds = RecordingIndicator::default();
        let mut r = Reporter::new(sink, leds.clone(), gas_alert_ppm(), None);

        // Ten clean-air samples around 0.75 V, then the gas arrives.
        let script = std::iter::repeat(Ok(1000)).take(10).chain([Ok(1000), Ok(3000)]);
        let mut sensors = vec![MqSensor::new(ScriptedAdc::new(script), MQ135, LOAD_CIRCUIT)];
        assert_eq!(
            gas::calibrate_all(&mut sensors, &mut RecordingDelay::default(), 10, 100),
            1
        );

        let (tx, rx) = mpsc::channel();
        r.apply(Measurement::Motion(true));

        assert!(gas::sample_all(&mut sensors, &tx));
        rx.try_iter().for_each(|m| r.apply(m));
        assert_eq!(r.snapshot().alert, AlertState::Safe);

        assert!(gas::sample_all(&mut sensors, &tx));
        rx.try_iter().for_each(|m| r.apply(m));
        assert_eq!(r.snapshot().alert, AlertState::Danger);
        assert_eq!(leds.history(), vec![AlertState::Safe, AlertState::Danger]);
    }

    #[test]
    fn publishes_mqtt_every_report() {
        let (mut r, sink, _leds) = reporter(None);
        r.apply(Measurement::Climate(CompensatedReading {
            temperature_c: 21.5,
            pressure_pa: 101_325,
        }));
        r.publish();
        r.publish();

        let sent = sink.messages();
        assert_eq!(sent.len(), 2);
        match &sent[0] {
            Outbound::Publish { topic, body } => {
                assert_eq!(*topic, MQTT_TOPIC);
                assert!(body.contains("\"temperature\":21.5"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn thingspeak_only_with_key_and_on_schedule() {
        let (mut r, sink, _leds) = reporter(Some("KEY"));
        for _ in 0..THINGSPEAK_EVERY {
            r.publish();
        }
        let gets: Vec<_> = sink
            .messages()
            .into_iter()
            .filter(|m| matches!(m, Outbound::Get { .. }))
            .collect();
        assert_eq!(gets.len(), 1);

        let (mut r, sink, _leds) = reporter(None);
        for _ in 0..THINGSPEAK_EVERY {
            r.publish();
        }
        assert!(sink.messages().iter().all(|m| matches!(m, Outbound::Publish { .. })));
    }

    #[test]
    fn schedule_keeps_cadence_when_on_time() {
        let t0 = Instant::now();
        let interval = Duration::from_secs(2);
        let now = t0 + Duration::from_millis(30);
        assert_eq!(next_deadline(t0, now, interval), t0 + interval);
    }

    #[test]
    fn schedule_skips_slots_missed_during_stall() {
        let t0 = Instant::now();
        let interval = Duration::from_secs(2);
        let now = t0 + Duration::from_secs(9);
        assert_eq!(next_deadline(t0, now, interval), now + interval);
    }

    #[test]
    fn task_exits_when_producers_drop() {
        let (tx, rx) = mpsc::channel();
        let (r, sink, _leds) = reporter(None);
        tx.send(gas(400.0)).unwrap();
        drop(tx);
        reporter_task(rx, r, Duration::from_secs(60));
        assert!(sink.messages().is_empty());
    }
}
