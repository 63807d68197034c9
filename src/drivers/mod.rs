// MirrorPulse — Hardware Drivers

use std::sync::Mutex;

use esp_idf_hal::i2c::I2cDriver;

pub mod display;
pub mod max30102;

/// Thread-safe handle to the shared I2C bus (OLED + pulse sensor).
pub type SharedBus = &'static Mutex<I2cDriver<'static>>;
