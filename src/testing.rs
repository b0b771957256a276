// Hardware stand-ins for host unit tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital;
use embedded_hal::i2c::{self, ErrorKind, NoAcknowledgeSource, Operation};

use crate::alert::{AlertIndicator, AlertState};
use crate::drivers::dht11::HumiditySensor;
use crate::drivers::mq::AnalogInput;
use crate::error::Result;
use crate::report::{Outbound, ReportSink};

// ---------------------------------------------------------------------------
// Delay
// ---------------------------------------------------------------------------
#[derive(Debug, Default)]
pub struct RecordingDelay {
    ns: u64,
}

impl RecordingDelay {
    pub fn total_us(&self) -> u64 {
        self.ns / 1000
    }
}

impl DelayNs for RecordingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.ns += u64::from(ns);
    }
}

// ---------------------------------------------------------------------------
// BMP180 register model
// ---------------------------------------------------------------------------

/// Calibration block from the BMP180 datasheet worked example.
pub const DATASHEET_CALIBRATION: [u8; 22] = [
    0x01, 0x98, // AC1 408
    0xFF, 0xB8, // AC2 -72
    0xC7, 0xD1, // AC3 -14383
    0x7F, 0xE5, // AC4 32741
    0x7F, 0xF5, // AC5 32757
    0x5A, 0x71, // AC6 23153
    0x18, 0x2E, // B1 6190
    0x00, 0x04, // B2 4
    0x80, 0x00, // MB -32768
    0xDD, 0xF9, // MC -8711
    0x0B, 0x34, // MD 2868
];

pub struct FakeBmp180 {
    regs: [u8; 256],
    temperature: [u8; 2],
    pressure: [u8; 3],
    /// Every value written to the control register, in order.
    pub commands: Vec<u8>,
    pub fail_all: bool,
}

impl FakeBmp180 {
    /// UT = 27898, UP = 23843 (oss 0), datasheet calibration.
    pub fn datasheet() -> Self {
        let mut regs = [0u8; 256];
        regs[0xAA..0xAA + 22].copy_from_slice(&DATASHEET_CALIBRATION);
        regs[0xD0] = 0x55;
        Self {
            regs,
            temperature: 27898u16.to_be_bytes(),
            pressure: [0x5D, 0x23, 0x00],
            commands: Vec::new(),
            fail_all: false,
        }
    }

    pub fn set_pressure_bytes(&mut self, bytes: [u8; 3]) {
        self.pressure = bytes;
    }

    fn start_conversion(&mut self, command: u8) {
        self.commands.push(command);
        if command == 0x2E {
            self.regs[0xF6..0xF8].copy_from_slice(&self.temperature);
        } else if command & 0x3F == 0x34 {
            self.regs[0xF6..0xF9].copy_from_slice(&self.pressure);
        }
    }
}

impl i2c::ErrorType for FakeBmp180 {
    type Error = ErrorKind;
}

impl i2c::I2c for FakeBmp180 {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> core::result::Result<(), Self::Error> {
        if self.fail_all || address != 0x77 {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }
        let mut pointer = 0usize;
        for op in operations {
            match op {
                Operation::Write(bytes) => {
                    let Some((&reg, rest)) = bytes.split_first() else {
                        continue;
                    };
                    pointer = usize::from(reg);
                    if let Some(&value) = rest.first() {
                        if reg == 0xF4 {
                            self.start_conversion(value);
                        } else {
                            self.regs[pointer] = value;
                        }
                    }
                }
                Operation::Read(buf) => {
                    for (i, b) in buf.iter_mut().enumerate() {
                        *b = self.regs[(pointer + i) & 0xFF];
                    }
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ADC
// ---------------------------------------------------------------------------
pub struct ConstantAdc(pub u16);

impl AnalogInput for ConstantAdc {
    fn read_raw(&mut self) -> Result<u16> {
        Ok(self.0)
    }
}

/// Plays back a fixed list of results, then repeats the last one.
pub struct ScriptedAdc {
    script: VecDeque<Result<u16>>,
    last: Result<u16>,
}

impl ScriptedAdc {
    pub fn new(script: impl IntoIterator<Item = Result<u16>>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(Ok(0));
        Self { script, last }
    }
}

impl AnalogInput for ScriptedAdc {
    fn read_raw(&mut self) -> Result<u16> {
        self.script.pop_front().unwrap_or(self.last)
    }
}

/// DHT11 stand-in: plays back a fixed list, then repeats the last result.
pub struct ScriptedHygrometer {
    script: VecDeque<Result<f32>>,
    last: Result<f32>,
}

impl ScriptedHygrometer {
    pub fn new(script: impl IntoIterator<Item = Result<f32>>) -> Self {
        let script: VecDeque<_> = script.into_iter().collect();
        let last = script.back().copied().unwrap_or(Ok(0.0));
        Self { script, last }
    }
}

impl HumiditySensor for ScriptedHygrometer {
    fn read_humidity(&mut self) -> Result<f32> {
        self.script.pop_front().unwrap_or(self.last)
    }
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// A pin whose level is shared between the test and the code under test.
#[derive(Debug, Clone, Default)]
pub struct SharedPin(Rc<Cell<bool>>);

impl SharedPin {
    pub fn level(&self) -> bool {
        self.0.get()
    }

    pub fn set(&self, high: bool) {
        self.0.set(high);
    }
}

impl digital::ErrorType for SharedPin {
    type Error = Infallible;
}

impl digital::InputPin for SharedPin {
    fn is_high(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(self.0.get())
    }

    fn is_low(&mut self) -> core::result::Result<bool, Self::Error> {
        Ok(!self.0.get())
    }
}

impl digital::OutputPin for SharedPin {
    fn set_low(&mut self) -> core::result::Result<(), Self::Error> {
        self.0.set(false);
        Ok(())
    }

    fn set_high(&mut self) -> core::result::Result<(), Self::Error> {
        self.0.set(true);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Reporting
// ---------------------------------------------------------------------------

/// Collects every outbound message; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink(Arc<Mutex<Vec<Outbound>>>);

impl RecordingSink {
    pub fn messages(&self) -> Vec<Outbound> {
        self.0.lock().unwrap().clone()
    }
}

impl ReportSink for RecordingSink {
    fn send(&mut self, message: &Outbound) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator(Rc<RefCell<Vec<AlertState>>>);

impl RecordingIndicator {
    pub fn history(&self) -> Vec<AlertState> {
        self.0.borrow().clone()
    }
}

impl AlertIndicator for RecordingIndicator {
    fn show(&mut self, state: AlertState) {
        self.0.borrow_mut().push(state);
    }
}
