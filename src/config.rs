// Smart Node — Hardware & System Configuration
// Target: ESP32 DevKit (Xtensa)

use std::time::Duration;

use crate::drivers::bmp180::Oversampling;
use crate::drivers::mq::{GasModel, LoadCircuit, ResponseCurve};
use crate::events::GasKind;

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (ESP32 DevKit pinout)
// ---------------------------------------------------------------------------
pub const PIN_I2C_SDA: i32 = 21;
pub const PIN_I2C_SCL: i32 = 22;
pub const PIN_PIR: i32 = 14;        // PIR motion sensor output (active HIGH)
pub const PIN_LED_RED: i32 = 25;
pub const PIN_LED_GREEN: i32 = 26;
pub const PIN_BUTTON: i32 = 27;     // Acknowledge button (INPUT_PULLUP, active LOW)
pub const PIN_DHT11: i32 = 4;       // DHT11 single-wire data
pub const PIN_MQ135: i32 = 34;      // ADC1_CHANNEL_6
pub const PIN_MQ5: i32 = 35;        // ADC1_CHANNEL_7
pub const PIN_MQ9: i32 = 32;        // ADC1_CHANNEL_4

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_BMP180: u8 = 0x77;
pub const I2C_BAUDRATE_KHZ: u32 = 100;

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_BAROMETER: usize = 4096;
pub const STACK_GAS: usize = 4096;
pub const STACK_HUMIDITY: usize = 3072;
pub const STACK_INPUT: usize = 3072;
pub const STACK_REPORTER: usize = 8192;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const CLIMATE_INTERVAL_MS: u64 = 2000;
pub const GAS_INTERVAL_MS: u64 = 5000;
pub const HUMIDITY_INTERVAL_MS: u64 = 5000;           // DHT11 needs ≥ 1 s between reads
pub const INPUT_POLL_INTERVAL_MS: u64 = 100;
pub const REPORT_INTERVAL_MS: u64 = 2000;
pub const CALIBRATION_SAMPLES: usize = 100;
pub const CALIBRATION_INTERVAL_MS: u32 = 100;       // 100 × 100 ms ≈ 10 s per channel

pub const BAROMETER_OVERSAMPLING: Oversampling = Oversampling::Standard;

// ---------------------------------------------------------------------------
// Gas sensor front-end (shared by all MQ channels)
// ---------------------------------------------------------------------------
pub const ADC_MAX_COUNT: u16 = 4095;                 // 12-bit oneshot
pub const ADC_REFERENCE_MV: f32 = 3100.0;             // full scale at 11 dB attenuation
pub const SENSOR_SUPPLY_MV: f32 = 5000.0;
pub const LOAD_RESISTANCE_OHMS: f32 = 10_000.0;

pub const LOAD_CIRCUIT: LoadCircuit = LoadCircuit {
    load_resistance_ohms: LOAD_RESISTANCE_OHMS,
    supply_mv: SENSOR_SUPPLY_MV,
    adc_reference_mv: ADC_REFERENCE_MV,
    adc_max_count: ADC_MAX_COUNT,
};

// ---------------------------------------------------------------------------
// Sensor models — log10(ppm) = slope · log10(Rs/R0) + intercept
// ---------------------------------------------------------------------------
pub const MQ135: GasModel = GasModel {
    name: "MQ-135",
    kind: GasKind::Co2,
    curve: ResponseCurve { slope: -0.42, intercept: 1.92 },
    clean_air_ratio: 3.6,
};

pub const MQ5: GasModel = GasModel {
    name: "MQ-5",
    kind: GasKind::Methane,
    curve: ResponseCurve { slope: -2.632, intercept: 2.5 },
    clean_air_ratio: 6.5,
};

pub const MQ9: GasModel = GasModel {
    name: "MQ-9",
    kind: GasKind::CarbonMonoxide,
    curve: ResponseCurve { slope: -0.48, intercept: 1.58 },
    clean_air_ratio: 9.8,
};

// ---------------------------------------------------------------------------
// Safety alert
// ---------------------------------------------------------------------------
/// Alarm when the CO₂ estimate exceeds this multiple of its clean-air value.
pub const GAS_ALERT_FACTOR: f32 = 1.5;

/// CO₂ alarm threshold in ppm, relative to the MQ-135 clean-air estimate.
pub fn gas_alert_ppm() -> f32 {
    MQ135.clean_air_ppm() * GAS_ALERT_FACTOR
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------
pub const MQTT_TOPIC: &str = "esp32/sensors/gas";
pub const THINGSPEAK_UPDATE_URL: &str = "http://api.thingspeak.com/update";
pub const THINGSPEAK_API_KEY: Option<&str> = option_env!("THINGSPEAK_API_KEY");
pub const THINGSPEAK_EVERY: u32 = 8;                 // every 8th report (~16 s)

pub fn report_interval() -> Duration {
    Duration::from_millis(REPORT_INTERVAL_MS)
}
