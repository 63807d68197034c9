// MirrorPulse — Heart-Rate Sensor Task
//
// Drives the whole sampling pipeline at a fixed 100 ms cadence: drain one
// FIFO sample, run peak detection + smoothing, forward the result to the UI
// task. Ticks are serialized — a slow bus transaction delays the next tick,
// it never overlaps it.

use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crate::config::*;
use crate::drivers::max30102::Max30102;
use crate::drivers::SharedBus;
use crate::events::{RawSample, SensorStatus, UiEvent};
use crate::hr::HrPipeline;

pub fn sensor_task(bus: SharedBus, ui_tx: Sender<UiEvent>) {
    log::info!("HR sensor task started");

    let mut sensor = Max30102::new(bus);
    let _ = sensor.init(); // failure is recorded in the health state below
    if !sensor.health().initialized {
        // Reported once; the engine stays disabled until an explicit
        // re-init (i.e. a reboot) — no retry loop hammering a dead bus.
        let _ = ui_tx.send(UiEvent::Status(SensorStatus::Unavailable));
        return;
    }
    let _ = ui_tx.send(UiEvent::Status(SensorStatus::Ready));

    let mut pipeline = HrPipeline::new();
    let interval = Duration::from_millis(HR_SAMPLE_INTERVAL_MS);

    loop {
        let tick_start = Instant::now();

        // A failed read is one missed tick: feed a zeroed sample so the
        // detector sees "no signal" instead of the error unwinding here.
        let sample = match sensor.read_fifo() {
            Ok(sample) => sample,
            Err(e) => {
                log::warn!("{}", e);
                RawSample::default()
            }
        };

        let smoothed = pipeline.process(sample.ir, crate::now_ms());
        if ui_tx.send(UiEvent::HrTick(smoothed)).is_err() {
            log::warn!("UI channel closed — exiting HR sensor task");
            return;
        }

        // Sleep for the remainder of the tick to keep the 10 Hz cadence.
        let elapsed = tick_start.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
}
