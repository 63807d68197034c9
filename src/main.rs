// MirrorPulse — Firmware Entry Point
//
// Heart-rate module of the smart-mirror project: a MAX30102 pulse oximeter
// and a small SSD1306 status OLED on one I2C bus.
//
// Boot sequence:
//   1. Display the MirrorPulse splash for 1 second.
//   2. Run component self-test (OLED + MAX30102 presence probes).
//   3. Spawn the sensor and UI tasks.
//
// A failed sensor probe does not abort boot — the status line reports it
// and the display keeps showing the idle placeholder.

mod config;
mod debounce;
mod drivers;
mod events;
mod hr;
mod tasks;

use std::sync::mpsc;
use std::sync::Mutex;
use std::thread;
use std::time::Duration;

use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;

use crate::config::*;
use crate::drivers::display::OledDisplay;
use crate::drivers::max30102::Max30102;

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days — fine for timeouts)
// ---------------------------------------------------------------------------
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("MirrorPulse firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;

    // ---- I2C bus (shared between OLED and MAX30102) ------------------------
    let i2c_config = I2cConfig::new().baudrate(400u32.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio6, // SDA
        peripherals.pins.gpio7, // SCL
        &i2c_config,
    )?;
    // SAFETY: The I2C peripheral is a singleton obtained from `Peripherals::take()`.
    // It will live for the entire programme duration (embedded firmware never exits).
    let i2c_bus: &'static Mutex<I2cDriver<'static>> =
        Box::leak(Box::new(Mutex::new(unsafe { core::mem::transmute(i2c) })));

    // ---- Boot sequence (display) ------------------------------------------
    let mut display = OledDisplay::new(i2c_bus);
    display.init()?;

    // Step 1 — splash
    display.show_splash()?;
    thread::sleep(Duration::from_millis(BOOT_SPLASH_MS));

    // Step 2 — component self-test
    let oled_ok = display.is_connected();
    let sensor_ok = Max30102::new(i2c_bus).is_connected();

    display.show_boot_status(oled_ok, sensor_ok)?;
    thread::sleep(Duration::from_secs(1));

    if !oled_ok || !sensor_ok {
        log::error!("Boot check FAILED — OLED:{} HR sensor:{}", oled_ok, sensor_ok);
        // Continue anyway so we can still debug via serial; the sensor task
        // reports Unavailable on its own if init fails.
    }
    log::info!("Boot complete — entering normal operation");

    // ---- Channels ---------------------------------------------------------
    let (ui_tx, ui_rx) = mpsc::channel();

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------

    // Sensor task — owns the MAX30102 and the whole detection pipeline.
    let sensor_bus = i2c_bus;
    let sensor_tx = ui_tx;
    thread::Builder::new()
        .name("sensor".into())
        .stack_size(STACK_SENSOR)
        .spawn(move || {
            tasks::sensor::sensor_task(sensor_bus, sensor_tx);
        })?;

    // UI task — owns the display and the debouncer.
    thread::Builder::new()
        .name("ui".into())
        .stack_size(STACK_UI)
        .spawn(move || {
            tasks::ui::ui_task(i2c_bus, ui_rx);
        })?;

    // Main thread has nothing left to do — park it forever.
    // (All work happens in the spawned FreeRTOS tasks.)
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
