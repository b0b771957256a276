// End-to-end checks through the public API only.

use std::sync::mpsc;

use embedded_hal::delay::DelayNs;

use smart_node::config::{LOAD_CIRCUIT, MQ135, MQ9};
use smart_node::drivers::bmp180::{compensate, CalibrationCoefficients, Oversampling};
use smart_node::drivers::mq::{AnalogInput, MqSensor};
use smart_node::events::{GasKind, Measurement};
use smart_node::tasks::gas;
use smart_node::{Error, Result};

struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

/// Ramps up by `step` counts on every read.
struct RampAdc {
    next: u16,
    step: u16,
}

impl AnalogInput for RampAdc {
    fn read_raw(&mut self) -> Result<u16> {
        let raw = self.next;
        self.next = self.next.saturating_add(self.step);
        Ok(raw)
    }
}

const DATASHEET: [u8; 22] = [
    0x01, 0x98, 0xFF, 0xB8, 0xC7, 0xD1, 0x7F, 0xE5, 0x7F, 0xF5, 0x5A, 0x71, 0x18, 0x2E, 0x00,
    0x04, 0x80, 0x00, 0xDD, 0xF9, 0x0B, 0x34,
];

#[test]
fn datasheet_worked_example() {
    let c = CalibrationCoefficients::from_bytes(&DATASHEET).unwrap();
    c.validate().unwrap();

    let r = compensate(27898, 23843, &c, Oversampling::UltraLowPower).unwrap();
    assert_eq!(r.temperature_c, 15.0);
    assert_eq!(r.pressure_pa, 69964);
}

#[test]
fn warmer_sensor_reads_warmer() {
    let c = CalibrationCoefficients::from_bytes(&DATASHEET).unwrap();
    let cold = compensate(27898, 23843, &c, Oversampling::UltraLowPower).unwrap();
    let warm = compensate(29000, 23843, &c, Oversampling::UltraLowPower).unwrap();
    assert!(warm.temperature_c > cold.temperature_c);
}

#[test]
fn uncalibrated_coefficients_are_rejected() {
    let blank = CalibrationCoefficients::default();
    assert_eq!(
        compensate(27898, 23843, &blank, Oversampling::Standard),
        Err(Error::NotCalibrated)
    );
}

#[test]
fn rising_output_means_rising_concentration() {
    let mut sensors = vec![
        MqSensor::new(RampAdc { next: 1000, step: 0 }, MQ135, LOAD_CIRCUIT),
        MqSensor::new(RampAdc { next: 800, step: 0 }, MQ9, LOAD_CIRCUIT),
    ];
    assert_eq!(gas::calibrate_all(&mut sensors, &mut NoDelay, 20, 100), 2);

    let (tx, rx) = mpsc::channel();
    assert!(gas::sample_all(&mut sensors, &tx));
    let readings: Vec<_> = rx.try_iter().collect();
    assert_eq!(readings.len(), 2);

    // In clean air Rs/R0 equals the clean-air ratio.
    match readings[0] {
        Measurement::Gas(GasKind::Co2, reading) => {
            let expected = 10f32.powf(-0.42 * 3.6f32.log10() + 1.92);
            assert!((reading.ppm - expected).abs() < expected * 1e-3);
        }
        ref other => panic!("unexpected {:?}", other),
    }

    let mut co2 = MqSensor::new(RampAdc { next: 1000, step: 200 }, MQ135, LOAD_CIRCUIT)
        .with_baseline(30_000.0)
        .unwrap();
    let first = co2.read().unwrap().ppm;
    let second = co2.read().unwrap().ppm;
    assert!(second > first);
}
