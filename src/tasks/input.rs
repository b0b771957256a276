// Smart Node — Input Task
//
// Polls the PIR and the acknowledge button.

use std::thread;
use std::time::Duration;

use embedded_hal::digital::InputPin;

use crate::config::*;
use crate::input::InputWatcher;

pub fn input_task<P: InputPin, B: InputPin>(mut watcher: InputWatcher<P, B>) {
    log::info!("Input task started (PIR GPIO{}, button GPIO{})", PIN_PIR, PIN_BUTTON);

    let poll = Duration::from_millis(INPUT_POLL_INTERVAL_MS);
    while watcher.update() {
        thread::sleep(poll);
    }
    log::warn!("Measurement channel closed — exiting input task");
}
