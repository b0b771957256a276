// Smart Node — GPIO Input Watcher
//
// Edge detector for the PIR motion sensor and the acknowledge button.
// Designed to be polled at ~10 Hz from the input task.  Levels are sampled
// raw, without debouncing.

use std::sync::mpsc::Sender;

use embedded_hal::digital::InputPin;

use crate::events::Measurement;

pub struct InputWatcher<P, B> {
    pir: P,
    button: B,
    tx: Sender<Measurement>,

    motion: Option<bool>,
    button_down: bool,
}

impl<P: InputPin, B: InputPin> InputWatcher<P, B> {
    pub fn new(pir: P, button: B, tx: Sender<Measurement>) -> Self {
        Self {
            pir,
            button,
            tx,
            motion: None,
            button_down: false,
        }
    }

    /// Sample both pins once.  Returns `false` once the receiver is gone.
    pub fn update(&mut self) -> bool {
        // ---- PIR (active HIGH) ----
        match self.pir.is_high() {
            Ok(level) if self.motion != Some(level) => {
                self.motion = Some(level);
                log::debug!("Motion {}", if level { "detected" } else { "cleared" });
                if self.tx.send(Measurement::Motion(level)).is_err() {
                    return false;
                }
            }
            Ok(_) => {}
            Err(_) => log::warn!("PIR read failed"),
        }

        // ---- button (active LOW with pull-up) ----
        match self.button.is_low() {
            Ok(pressed) => {
                let edge = pressed && !self.button_down;
                self.button_down = pressed;
                if edge && self.tx.send(Measurement::ButtonPressed).is_err() {
                    return false;
                }
            }
            Err(_) => log::warn!("Button read failed"),
        }

        true
    }
}
