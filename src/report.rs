// Smart Node — Report Payloads
//
// Latest-value snapshot of every sensor and the text payloads built from it.
// Transports (MQTT broker, ThingSpeak over HTTP) sit behind `ReportSink`; the
// firmware only ships a sink that writes to the serial log.

use serde::Serialize;

use crate::alert::AlertState;
use crate::config::{MQTT_TOPIC, THINGSPEAK_UPDATE_URL};
use crate::drivers::bmp180::CompensatedReading;
use crate::events::GasKind;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub climate: Option<CompensatedReading>,
    pub humidity: Option<f32>,
    pub co2_ppm: Option<f32>,
    pub ch4_ppm: Option<f32>,
    pub co_ppm: Option<f32>,
    pub motion: bool,
    pub alert: AlertState,
}

/// JSON body published on the MQTT topic.  Absent readings are omitted.
#[derive(Debug, Serialize)]
struct Payload {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pressure: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    humidity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    co2: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ch4: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    co: Option<f32>,
    motion: bool,
    alert: bool,
}

fn round2(v: f32) -> f32 {
    (v * 100.0).round() / 100.0
}

impl Snapshot {
    pub fn gas_mut(&mut self, kind: GasKind) -> &mut Option<f32> {
        match kind {
            GasKind::Co2 => &mut self.co2_ppm,
            GasKind::Methane => &mut self.ch4_ppm,
            GasKind::CarbonMonoxide => &mut self.co_ppm,
        }
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        let payload = Payload {
            temperature: self.climate.map(|c| round2(c.temperature_c)),
            pressure: self.climate.map(|c| round2(c.pressure_hpa())),
            humidity: self.humidity.map(round2),
            co2: self.co2_ppm.map(round2),
            ch4: self.ch4_ppm.map(round2),
            co: self.co_ppm.map(round2),
            motion: self.motion,
            alert: self.alert == AlertState::Danger,
        };
        Ok(serde_json::to_string(&payload)?)
    }

    /// ThingSpeak channel update: field1 °C, field2 hPa, field3 CO₂ ppm,
    /// field4 motion.
    pub fn thingspeak_url(&self, api_key: &str) -> String {
        let mut url = format!("{}?api_key={}", THINGSPEAK_UPDATE_URL, api_key);
        if let Some(c) = self.climate {
            url += &format!("&field1={:.2}&field2={:.2}", c.temperature_c, c.pressure_hpa());
        }
        if let Some(co2) = self.co2_ppm {
            url += &format!("&field3={:.2}", co2);
        }
        url += &format!("&field4={}", u8::from(self.motion));
        url
    }

    /// One-line human readable summary for the serial console.
    pub fn status_line(&self) -> String {
        let mut line = match self.climate {
            Some(c) => format!("Temp: {:.1} C | Pressure: {:.0} hPa", c.temperature_c, c.pressure_hpa()),
            None => String::from("Temp: -- | Pressure: --"),
        };
        match self.humidity {
            Some(rh) => line += &format!(" | Humidity: {:.1} %", rh),
            None => line.push_str(" | Humidity: --"),
        }
        for (label, value) in [
            (GasKind::Co2.display_name(), self.co2_ppm),
            (GasKind::Methane.display_name(), self.ch4_ppm),
            (GasKind::CarbonMonoxide.display_name(), self.co_ppm),
        ] {
            match value {
                Some(ppm) => line += &format!(" | {}: {:.2} ppm", label, ppm),
                None => line += &format!(" | {}: --", label),
            }
        }
        line += &format!(
            " | Motion: {} | Status: {}",
            if self.motion { "YES" } else { "NO" },
            self.alert.label()
        );
        line
    }
}

// ---------------------------------------------------------------------------
// Outbound messages
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// MQTT publish of a JSON body.
    Publish { topic: &'static str, body: String },
    /// HTTP GET of a fully formed URL.
    Get { url: String },
}

impl Outbound {
    pub fn mqtt(snapshot: &Snapshot) -> anyhow::Result<Self> {
        Ok(Self::Publish {
            topic: MQTT_TOPIC,
            body: snapshot.to_json()?,
        })
    }
}

pub trait ReportSink {
    fn send(&mut self, message: &Outbound) -> anyhow::Result<()>;
}

/// Writes outbound messages to the serial log.
#[derive(Debug, Default)]
pub struct LogSink;

impl ReportSink for LogSink {
    fn send(&mut self, message: &Outbound) -> anyhow::Result<()> {
        match message {
            Outbound::Publish { topic, body } => log::info!("MQTT {} ← {}", topic, body),
            Outbound::Get { url } => log::info!("HTTP GET {}", url),
        }
        Ok(())
    }
}
