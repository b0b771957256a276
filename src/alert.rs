// Smart Node — Safety Alert
//
// Latching gas/occupancy alarm.  A high CO₂ estimate while someone is in the
// room raises the alarm; it stays raised until the acknowledge button is
// pressed, even if the gas clears on its own.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertState {
    #[default]
    Safe,
    Danger,
}

impl AlertState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "SAFE",
            Self::Danger => "DANGER",
        }
    }
}

/// Anything that can show the alert state to a person (LEDs, buzzer…).
pub trait AlertIndicator {
    fn show(&mut self, state: AlertState);
}

pub struct SafetyMonitor {
    threshold_ppm: f32,
    state: AlertState,
}

impl SafetyMonitor {
    pub fn new(threshold_ppm: f32) -> Self {
        Self {
            threshold_ppm,
            state: AlertState::Safe,
        }
    }

    pub fn state(&self) -> AlertState {
        self.state
    }

    /// Feed the latest gas estimate and motion level.  Returns the new state
    /// when it changed.
    pub fn evaluate(&mut self, gas_ppm: Option<f32>, motion: bool) -> Option<AlertState> {
        let over_limit = gas_ppm.is_some_and(|ppm| ppm > self.threshold_ppm);
        if self.state == AlertState::Safe && over_limit && motion {
            self.state = AlertState::Danger;
            log::warn!(
                "Gas above {:.0} ppm with motion present — alert raised",
                self.threshold_ppm
            );
            return Some(self.state);
        }
        None
    }

    /// Button press: clears a raised alert, otherwise does nothing.
    pub fn acknowledge(&mut self) -> Option<AlertState> {
        if self.state == AlertState::Danger {
            self.state = AlertState::Safe;
            log::info!("Alert acknowledged");
            return Some(self.state);
        }
        None
    }
}
