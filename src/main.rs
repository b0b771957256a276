// Smart Node — Firmware Entry Point
//
// Boot sequence:
//   1. Bring up the I2C bus, GPIO and status LEDs.
//   2. Spawn the barometer, humidity, gas, input and reporter tasks.
//
// The gas task spends its first ~30 s calibrating the three MQ channels in
// clean air; gas fields stay empty in the reports until then.

#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    use esp_idf_hal::delay::{Delay, FreeRtos};
    use esp_idf_hal::gpio::{IOPin, PinDriver, Pull};
    use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
    use esp_idf_hal::prelude::*;

    use smart_node::config::*;
    use smart_node::drivers::adc::{self, OneshotAdc, OneshotChannel};
    use smart_node::drivers::bmp180::Bmp180;
    use smart_node::drivers::dht11::Dht11Sensor;
    use smart_node::drivers::led::StatusLeds;
    use smart_node::drivers::mq::MqSensor;
    use smart_node::input::InputWatcher;
    use smart_node::report::LogSink;
    use smart_node::tasks;
    use smart_node::tasks::reporter::Reporter;

    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Smart Node firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio21, // SDA
        peripherals.pins.gpio22, // SCL
        &i2c_config,
    )?;
    let barometer = Bmp180::new(i2c, Delay::new_default());

    let dht_pin = PinDriver::input_output_od(peripherals.pins.gpio4.downgrade())?;
    let hygrometer = Dht11Sensor::new(dht_pin);

    let pir = PinDriver::input(peripherals.pins.gpio14)?;
    let mut button = PinDriver::input(peripherals.pins.gpio27)?;
    button.set_pull(Pull::Up)?;

    let red = PinDriver::output(peripherals.pins.gpio25)?;
    let green = PinDriver::output(peripherals.pins.gpio26)?;
    let leds = StatusLeds::new(red, green);

    // ---- Channels ---------------------------------------------------------
    let (tx, rx) = mpsc::channel();

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------
    let baro_tx = tx.clone();
    thread::Builder::new()
        .name("barometer".into())
        .stack_size(STACK_BAROMETER)
        .spawn(move || tasks::barometer::barometer_task(barometer, baro_tx))?;

    let humidity_tx = tx.clone();
    thread::Builder::new()
        .name("humidity".into())
        .stack_size(STACK_HUMIDITY)
        .spawn(move || tasks::humidity::humidity_task(hygrometer, humidity_tx))?;

    // The ADC handle is not Send, so the channels are created on the gas
    // thread itself.
    let gas_tx = tx.clone();
    thread::Builder::new()
        .name("gas".into())
        .stack_size(STACK_GAS)
        .spawn(move || {
            let sensors = OneshotAdc::new().and_then(|unit| {
                Ok(vec![
                    MqSensor::new(OneshotChannel::new(&unit, adc::MQ135_CHANNEL)?, MQ135, LOAD_CIRCUIT),
                    MqSensor::new(OneshotChannel::new(&unit, adc::MQ5_CHANNEL)?, MQ5, LOAD_CIRCUIT),
                    MqSensor::new(OneshotChannel::new(&unit, adc::MQ9_CHANNEL)?, MQ9, LOAD_CIRCUIT),
                ])
            });
            match sensors {
                Ok(sensors) => tasks::gas::gas_task(sensors, FreeRtos, gas_tx),
                Err(e) => log::error!("Gas sensors unavailable: {}", e),
            }
        })?;

    let watcher = InputWatcher::new(pir, button, tx);
    thread::Builder::new()
        .name("input".into())
        .stack_size(STACK_INPUT)
        .spawn(move || tasks::input::input_task(watcher))?;

    thread::Builder::new()
        .name("reporter".into())
        .stack_size(STACK_REPORTER)
        .spawn(move || {
            let threshold = gas_alert_ppm();
            log::info!("CO₂ alert threshold {:.1} ppm", threshold);
            let reporter = Reporter::new(LogSink, leds, threshold, THINGSPEAK_API_KEY);
            tasks::reporter::reporter_task(rx, reporter, report_interval());
        })?;

    log::info!("Boot complete — entering normal operation");

    // Main thread has nothing left to do — park it forever.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}

#[cfg(not(target_os = "espidf"))]
fn main() {
    eprintln!("smart-node is ESP32 firmware; build it for the espidf target, or run `cargo test` on the host");
}
