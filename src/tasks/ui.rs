// MirrorPulse — UI Task
//
// Owns the OLED and the display debouncer. Drains pipeline ticks from the
// sensor task and redraws only when the debouncer says the visible view
// actually changed.

use std::sync::mpsc::Receiver;
use std::thread;
use std::time::Duration;

use crate::config::*;
use crate::debounce::DisplayDebouncer;
use crate::drivers::display::OledDisplay;
use crate::drivers::SharedBus;
use crate::events::{DisplayView, UiEvent};

pub fn ui_task(bus: SharedBus, ui_rx: Receiver<UiEvent>) {
    log::info!("UI task started");

    let mut display = OledDisplay::new(bus);
    let mut debouncer = DisplayDebouncer::new(crate::now_ms());

    if let Err(e) = display.show_view(DisplayView::Waiting) {
        log::error!("Display error: {}", e);
    }

    let poll_interval = Duration::from_millis(UI_POLL_INTERVAL_MS);

    loop {
        // Drain all pending events (non-blocking).
        while let Ok(event) = ui_rx.try_recv() {
            match event {
                UiEvent::Status(status) => {
                    log::info!("{}", status.label());
                    if let Err(e) = display.show_status(status) {
                        log::error!("Display error: {}", e);
                    }
                }
                UiEvent::HrTick(reading) => {
                    if let Some(view) = debouncer.tick(reading, crate::now_ms()) {
                        if let Err(e) = display.show_view(view) {
                            log::error!("Display error: {}", e);
                        }
                    }
                }
            }
        }

        thread::sleep(poll_interval);
    }
}
