// Smart Node — System Events & Data Types

use crate::drivers::bmp180::CompensatedReading;

// ---------------------------------------------------------------------------
// Gas channels
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GasKind {
    Co2,
    Methane,
    CarbonMonoxide,
}

impl GasKind {
    /// Short label used in log lines.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Co2 => "CO₂",
            Self::Methane => "CH₄",
            Self::CarbonMonoxide => "CO",
        }
    }
}

/// One estimated concentration together with the values it was derived from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GasReading {
    pub millivolts: f32,
    pub resistance_ohms: f32,
    pub ppm: f32,
}

// ---------------------------------------------------------------------------
// Measurements — sent to the reporter task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Measurement {
    /// BMP180 temperature and pressure.
    Climate(CompensatedReading),
    /// DHT11 relative humidity in %, `None` when the read failed.
    Humidity(Option<f32>),
    /// One MQ channel.
    Gas(GasKind, GasReading),
    /// An MQ channel failed to produce a reading this cycle.
    GasUnavailable(GasKind),
    /// PIR output changed level.
    Motion(bool),
    /// Acknowledge button went down.
    ButtonPressed,
}
