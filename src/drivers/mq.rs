// Smart Node — MQ-series Gas Sensor Driver
//
// The sensor is a heated resistor Rs in series with a load resistor RL; the
// ADC measures the voltage across RL.  Rs against the clean-air baseline R0
// maps onto a gas concentration through a log-log curve fitted to the
// datasheet plot:
//
//     log10(ppm) = slope · log10(Rs / R0) + intercept
//
// R0 is unknown until `calibrate_baseline` has sampled the sensor in clean
// air, where Rs / R0 equals the datasheet clean-air ratio.

use embedded_hal::delay::DelayNs;

use crate::error::{Error, Result};
use crate::events::{GasKind, GasReading};

/// A single analog input returning raw conversion counts.
pub trait AnalogInput {
    fn read_raw(&mut self) -> Result<u16>;
}

impl<T: AnalogInput + ?Sized> AnalogInput for &mut T {
    fn read_raw(&mut self) -> Result<u16> {
        (**self).read_raw()
    }
}

/// Electrical constants of the voltage divider and ADC front-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadCircuit {
    pub load_resistance_ohms: f32,
    pub supply_mv: f32,
    pub adc_reference_mv: f32,
    pub adc_max_count: u16,
}

impl LoadCircuit {
    /// Linear count → millivolt conversion.
    pub fn millivolts(&self, raw: u16) -> f32 {
        f32::from(raw) / f32::from(self.adc_max_count) * self.adc_reference_mv
    }

    /// Rs = (Vsupply − Vout) / Vout · RL
    ///
    /// A zero reading means a floating or disconnected sensor and has no
    /// finite answer.
    pub fn load_resistance(&self, vout_mv: f32) -> Result<f32> {
        if !(vout_mv > 0.0) {
            return Err(Error::InvalidInput("sensor output is 0 mV"));
        }
        if vout_mv > self.supply_mv {
            return Err(Error::InvalidInput("sensor output above supply rail"));
        }
        let rs = (self.supply_mv - vout_mv) / vout_mv * self.load_resistance_ohms;
        if !rs.is_finite() {
            return Err(Error::InvalidInput("load resistance is not finite"));
        }
        Ok(rs)
    }
}

/// Empirical log-log fit for one gas on one sensor model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResponseCurve {
    pub slope: f32,
    pub intercept: f32,
}

impl ResponseCurve {
    pub fn ppm(&self, rs: f32, r0: f32) -> Result<f32> {
        estimate_ppm(rs, r0, self)
    }
}

/// Everything that distinguishes one MQ sensor type from another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasModel {
    pub name: &'static str,
    pub kind: GasKind,
    pub curve: ResponseCurve,
    /// Rs / R0 in clean air, read off the datasheet curve.
    pub clean_air_ratio: f32,
}

impl GasModel {
    /// Concentration the curve reports for a sensor sitting in clean air.
    pub fn clean_air_ppm(&self) -> f32 {
        10f32.powf(self.curve.slope * self.clean_air_ratio.log10() + self.curve.intercept)
    }
}

/// ppm = 10^(slope · log10(Rs/R0) + intercept)
pub fn estimate_ppm(rs: f32, r0: f32, curve: &ResponseCurve) -> Result<f32> {
    let ratio = rs / r0;
    if !(ratio > 0.0) || !ratio.is_finite() {
        return Err(Error::InvalidInput("Rs/R0 must be positive and finite"));
    }
    let log_ppm = curve.slope * ratio.log10() + curve.intercept;
    let ppm = 10f32.powf(log_ppm);
    if !ppm.is_finite() {
        return Err(Error::InvalidInput("ppm estimate overflowed"));
    }
    Ok(ppm)
}

pub struct MqSensor<A> {
    adc: A,
    model: GasModel,
    circuit: LoadCircuit,
    r0: Option<f32>,
}

impl<A: AnalogInput> MqSensor<A> {
    pub fn new(adc: A, model: GasModel, circuit: LoadCircuit) -> Self {
        Self {
            adc,
            model,
            circuit,
            r0: None,
        }
    }

    /// Start from a previously measured baseline instead of calibrating.
    pub fn with_baseline(mut self, r0: f32) -> Result<Self> {
        if !(r0 > 0.0) || !r0.is_finite() {
            return Err(Error::InvalidInput("R0 must be positive and finite"));
        }
        self.r0 = Some(r0);
        Ok(self)
    }

    pub fn model(&self) -> &GasModel {
        &self.model
    }

    pub fn baseline(&self) -> Option<f32> {
        self.r0
    }

    pub fn read_millivolts(&mut self) -> Result<f32> {
        let raw = self.adc.read_raw()?;
        Ok(self.circuit.millivolts(raw))
    }

    pub fn read_resistance(&mut self) -> Result<f32> {
        let mv = self.read_millivolts()?;
        self.circuit.load_resistance(mv)
    }

    /// Average Rs over `samples` readings spaced `interval_ms` apart and
    /// derive R0 from the clean-air ratio.  Blocks for the whole run.
    ///
    /// Any failed sample aborts the run and leaves the previous baseline in
    /// place.
    pub fn calibrate_baseline(
        &mut self,
        delay: &mut impl DelayNs,
        samples: usize,
        interval_ms: u32,
    ) -> Result<f32> {
        if samples == 0 {
            return Err(Error::InvalidInput("calibration needs at least one sample"));
        }
        log::info!("Calibrating R0 for {} ({} samples)…", self.model.name, samples);

        let mut sum = 0.0f64;
        for _ in 0..samples {
            sum += f64::from(self.read_resistance()?);
            delay.delay_ms(interval_ms);
        }
        let mean = (sum / samples as f64) as f32;
        let r0 = mean / self.model.clean_air_ratio;
        if !(r0 > 0.0) || !r0.is_finite() {
            return Err(Error::InvalidInput("calibration produced a non-positive R0"));
        }

        self.r0 = Some(r0);
        log::info!("{} calibration complete. R0 = {:.2} Ω", self.model.name, r0);
        Ok(r0)
    }

    /// Sample once and estimate the concentration.
    pub fn read(&mut self) -> Result<GasReading> {
        let r0 = self.r0.ok_or(Error::NotCalibrated)?;
        let millivolts = self.read_millivolts()?;
        let resistance_ohms = self.circuit.load_resistance(millivolts)?;
        let ppm = estimate_ppm(resistance_ohms, r0, &self.model.curve)?;

        Ok(GasReading {
            millivolts,
            resistance_ohms,
            ppm,
        })
    }
}
