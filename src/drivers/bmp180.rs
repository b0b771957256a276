// Smart Node — BMP180 Barometer Driver
//
// Register-level driver over any `embedded_hal` I2C bus, plus the datasheet
// fixed-point compensation pipeline.  The math lives in free functions so it
// can be checked against the datasheet worked example without hardware.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::{Error as _, I2c};

use crate::config::I2C_ADDR_BMP180;
use crate::error::{Error, Result};

// BMP180 register addresses
const REG_CALIBRATION: u8 = 0xAA; // Start of 22-byte AC1..MD block
const REG_CHIP_ID: u8 = 0xD0;
const REG_CONTROL: u8 = 0xF4;
const REG_OUT_MSB: u8 = 0xF6;
const CHIP_ID_EXPECTED: u8 = 0x55;

const CMD_TEMPERATURE: u8 = 0x2E;
const CMD_PRESSURE: u8 = 0x34;
const TEMPERATURE_SETTLE_US: u32 = 4500;

pub const CALIBRATION_LEN: usize = 22;

// ---------------------------------------------------------------------------
// Oversampling
// ---------------------------------------------------------------------------

/// Pressure oversampling setting (`oss`): trades conversion time for noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Oversampling {
    /// 1 internal sample, 4.5 ms.
    UltraLowPower,
    /// 2 internal samples, 7.5 ms.
    #[default]
    Standard,
    /// 4 internal samples, 13.5 ms.
    HighResolution,
    /// 8 internal samples, 25.5 ms.
    UltraHighResolution,
}

impl Oversampling {
    pub fn from_bits(oss: u8) -> Result<Self> {
        match oss {
            0 => Ok(Self::UltraLowPower),
            1 => Ok(Self::Standard),
            2 => Ok(Self::HighResolution),
            3 => Ok(Self::UltraHighResolution),
            other => Err(Error::InvalidOversampling(other)),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::UltraLowPower => 0,
            Self::Standard => 1,
            Self::HighResolution => 2,
            Self::UltraHighResolution => 3,
        }
    }

    /// Maximum conversion time from the datasheet.
    pub fn settle_time_us(self) -> u32 {
        match self {
            Self::UltraLowPower => 4500,
            Self::Standard => 7500,
            Self::HighResolution => 13_500,
            Self::UltraHighResolution => 25_500,
        }
    }

    fn command(self) -> u8 {
        CMD_PRESSURE + (self.bits() << 6)
    }
}

// ---------------------------------------------------------------------------
// Calibration data
// ---------------------------------------------------------------------------

/// Factory calibration words read once from the sensor EEPROM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CalibrationCoefficients {
    pub ac1: i16,
    pub ac2: i16,
    pub ac3: i16,
    pub ac4: u16,
    pub ac5: u16,
    pub ac6: u16,
    pub b1: i16,
    pub b2: i16,
    pub mb: i16,
    pub mc: i16,
    pub md: i16,
}

impl CalibrationCoefficients {
    /// Decode the big-endian AC1..MD block starting at register 0xAA.
    pub fn from_bytes(raw: &[u8]) -> Result<Self> {
        if raw.len() < CALIBRATION_LEN {
            return Err(Error::ShortCalibration(raw.len()));
        }
        let word = |i: usize| [raw[2 * i], raw[2 * i + 1]];

        Ok(Self {
            ac1: i16::from_be_bytes(word(0)),
            ac2: i16::from_be_bytes(word(1)),
            ac3: i16::from_be_bytes(word(2)),
            ac4: u16::from_be_bytes(word(3)),
            ac5: u16::from_be_bytes(word(4)),
            ac6: u16::from_be_bytes(word(5)),
            b1: i16::from_be_bytes(word(6)),
            b2: i16::from_be_bytes(word(7)),
            mb: i16::from_be_bytes(word(8)),
            mc: i16::from_be_bytes(word(9)),
            md: i16::from_be_bytes(word(10)),
        })
    }

    /// The words in EEPROM order, as raw 16-bit patterns.
    fn words(&self) -> [u16; 11] {
        [
            self.ac1 as u16,
            self.ac2 as u16,
            self.ac3 as u16,
            self.ac4,
            self.ac5,
            self.ac6,
            self.b1 as u16,
            self.b2 as u16,
            self.mb as u16,
            self.mc as u16,
            self.md as u16,
        ]
    }

    /// Datasheet communication check: no word may read 0x0000 or 0xFFFF.
    pub fn validate(&self) -> Result<()> {
        match self
            .words()
            .iter()
            .enumerate()
            .find(|&(_, &w)| w == 0x0000 || w == 0xFFFF)
        {
            Some((index, &raw)) => Err(Error::InvalidCalibration { index, raw }),
            None => Ok(()),
        }
    }

    fn is_blank(&self) -> bool {
        *self == Self::default()
    }
}

// ---------------------------------------------------------------------------
// Compensation
// ---------------------------------------------------------------------------

/// Calibrated output of one measurement cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompensatedReading {
    pub temperature_c: f32,
    pub pressure_pa: i32,
}

impl CompensatedReading {
    pub fn pressure_hpa(&self) -> f32 {
        self.pressure_pa as f32 / 100.0
    }
}

/// Datasheet compensation of raw `ut`/`up` counts.
///
/// Scaling by 2^n is an arithmetic shift and the three real divisions
/// truncate, exactly like the vendor reference code.  Intermediates are
/// widened to 64 bits so nonsense input cannot overflow; for any real sensor
/// the results are identical to the 32-bit pipeline.
pub fn compensate(
    ut: i32,
    up: i32,
    c: &CalibrationCoefficients,
    oss: Oversampling,
) -> Result<CompensatedReading> {
    if c.is_blank() {
        return Err(Error::NotCalibrated);
    }
    let oss = u32::from(oss.bits());

    // Temperature
    let x1 = ((i64::from(ut) - i64::from(c.ac6)) * i64::from(c.ac5)) >> 15;
    let divisor = x1 + i64::from(c.md);
    if divisor == 0 {
        return Err(Error::InvalidInput("X1 + MD is zero"));
    }
    let x2 = (i64::from(c.mc) << 11) / divisor;
    let b5 = x1 + x2;
    let temperature_c = ((b5 + 8) >> 4) as f32 / 10.0;

    // Pressure
    let b6 = b5 - 4000;
    let b6_sq = (b6 * b6) >> 12;
    let x1 = (i64::from(c.b2) * b6_sq) >> 11;
    let x2 = (i64::from(c.ac2) * b6) >> 11;
    let x3 = x1 + x2;
    let b3 = (((i64::from(c.ac1) * 4 + x3) << oss) + 2) / 4;

    let x1 = (i64::from(c.ac3) * b6) >> 13;
    let x2 = (i64::from(c.b1) * b6_sq) >> 16;
    let x3 = (x1 + x2 + 2) >> 2;
    let b4 = ((u64::from(c.ac4) * u64::from((x3 + 32768) as u32)) >> 15) as u32;
    if b4 == 0 {
        return Err(Error::InvalidInput("B4 is zero"));
    }

    // UP < B3 wraps in u32, matching the device firmware.
    let b7 = ((i64::from(up) - b3) as u32).wrapping_mul(50_000 >> oss);
    let p = i64::from(if b7 < 0x8000_0000 {
        (b7 << 1) / b4
    } else {
        (b7 / b4) << 1
    });

    let x1 = (p >> 8) * (p >> 8);
    let x1 = (x1 * 3038) >> 16;
    let x2 = (-7357 * p) >> 16;
    let pressure_pa = (p + ((x1 + x2 + 3791) >> 4)) as i32;

    Ok(CompensatedReading {
        temperature_c,
        pressure_pa,
    })
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Bmp180<I2C, D> {
    i2c: I2C,
    delay: D,
    address: u8,
    coefficients: Option<CalibrationCoefficients>,
}

impl<I2C: I2c, D: DelayNs> Bmp180<I2C, D> {
    pub fn new(i2c: I2C, delay: D) -> Self {
        Self {
            i2c,
            delay,
            address: I2C_ADDR_BMP180,
            coefficients: None,
        }
    }

    /// Verify the device answers with the BMP180 chip id.
    pub fn is_connected(&mut self) -> bool {
        let mut buf = [0u8; 1];
        match self.i2c.write_read(self.address, &[REG_CHIP_ID], &mut buf) {
            Ok(()) => buf[0] == CHIP_ID_EXPECTED,
            Err(_) => false,
        }
    }

    /// Read and check the factory calibration block.  Must succeed before
    /// [`Self::measure`] will return anything.
    pub fn init(&mut self) -> Result<CalibrationCoefficients> {
        let mut raw = [0u8; CALIBRATION_LEN];
        self.read_block(REG_CALIBRATION, &mut raw)?;

        let coefficients = CalibrationCoefficients::from_bytes(&raw)?;
        coefficients.validate()?;
        self.coefficients = Some(coefficients);

        log::info!("BMP180 calibration loaded: {:?}", coefficients);
        Ok(coefficients)
    }

    pub fn coefficients(&self) -> Option<&CalibrationCoefficients> {
        self.coefficients.as_ref()
    }

    /// Trigger a temperature conversion and read the 16-bit `UT` count.
    pub fn read_raw_temperature(&mut self) -> Result<i32> {
        self.write_register(REG_CONTROL, CMD_TEMPERATURE)?;
        self.delay.delay_us(TEMPERATURE_SETTLE_US);

        let mut buf = [0u8; 2];
        self.read_block(REG_OUT_MSB, &mut buf)?;
        Ok(i32::from(u16::from_be_bytes(buf)))
    }

    /// Trigger a pressure conversion and read the 16..19-bit `UP` count.
    pub fn read_raw_pressure(&mut self, oss: Oversampling) -> Result<i32> {
        self.write_register(REG_CONTROL, oss.command())?;
        self.delay.delay_us(oss.settle_time_us());

        let mut buf = [0u8; 3];
        self.read_block(REG_OUT_MSB, &mut buf)?;
        let raw = (i32::from(buf[0]) << 16) | (i32::from(buf[1]) << 8) | i32::from(buf[2]);
        Ok(raw >> (8 - oss.bits()))
    }

    /// One full measurement cycle: UT, UP, compensation.
    pub fn measure(&mut self, oss: Oversampling) -> Result<CompensatedReading> {
        let coefficients = self.coefficients.ok_or(Error::NotCalibrated)?;
        let ut = self.read_raw_temperature()?;
        let up = self.read_raw_pressure(oss)?;
        compensate(ut, up, &coefficients, oss)
    }

    /// Give the bus and delay back to the caller.
    pub fn release(self) -> (I2C, D) {
        (self.i2c, self.delay)
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<()> {
        self.i2c
            .write(self.address, &[reg, value])
            .map_err(|e| Error::I2c(e.kind()))
    }

    fn read_block(&mut self, reg: u8, buf: &mut [u8]) -> Result<()> {
        self.i2c
            .write_read(self.address, &[reg], buf)
            .map_err(|e| Error::I2c(e.kind()))
    }
}
