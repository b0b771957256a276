// Smart Node — Status LED Driver
//
// Red/green LED pair on plain GPIO outputs.

use embedded_hal::digital::OutputPin;

use crate::alert::{AlertIndicator, AlertState};

pub struct StatusLeds<R, G> {
    red: R,
    green: G,
}

impl<R: OutputPin, G: OutputPin> StatusLeds<R, G> {
    pub fn new(red: R, green: G) -> Self {
        Self { red, green }
    }
}

impl<R: OutputPin, G: OutputPin> AlertIndicator for StatusLeds<R, G> {
    fn show(&mut self, state: AlertState) {
        let danger = state == AlertState::Danger;
        if self.red.set_state(danger.into()).is_err() || self.green.set_state((!danger).into()).is_err() {
            log::warn!("Status LED update failed");
        }
    }
}
