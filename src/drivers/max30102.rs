// MirrorPulse — MAX30102 Pulse Oximeter Driver
//
// Custom register-level driver over shared I2C bus.
// Avoids external crate version conflicts with esp-idf-hal.
//
// Only the heart-rate path is configured: the FIFO is polled for red/IR
// pairs and the red channel is discarded downstream (no SpO2 computation).

use std::fmt;

use esp_idf_sys::EspError;

use crate::config::*;
use crate::drivers::SharedBus;
use crate::events::RawSample;

// MAX30102 register addresses
const REG_FIFO_DATA: u8 = 0x07;
const REG_MODE_CONFIG: u8 = 0x09;
const REG_SPO2_CONFIG: u8 = 0x0A;
const REG_LED1_PA: u8 = 0x0C;
const REG_LED2_PA: u8 = 0x0D;
const REG_PART_ID: u8 = 0xFF;
const PART_ID_EXPECTED: u8 = 0x15;

// Register values (must match the MAX30102 datasheet exactly)
const MODE_RESET: u8 = 0x40;
const MODE_HEART_RATE: u8 = 0x03;
const SPO2_CONFIG_400HZ_16BIT: u8 = 0x27;
const LED_CURRENT_MAX: u8 = 0x3F;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Bus-level failures, split by recovery posture: a failed init disables the
/// sensor until an explicit re-init, a failed read is one missed tick.
#[derive(Debug, Clone, Copy)]
pub enum SensorError {
    InitFailure(EspError),
    ReadFailure(EspError),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitFailure(e) => write!(f, "sensor init failed: {}", e),
            Self::ReadFailure(e) => write!(f, "FIFO read failed: {}", e),
        }
    }
}

impl std::error::Error for SensorError {}

/// Startup outcome, readable by callers deciding whether to poll at all.
#[derive(Debug, Clone, Default)]
pub struct SensorHealth {
    pub initialized: bool,
    pub last_error: Option<String>,
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct Max30102 {
    bus: SharedBus,
    health: SensorHealth,
}

impl Max30102 {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            health: SensorHealth::default(),
        }
    }

    /// Verify the device is reachable on the I2C bus.
    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        let mut buf = [0u8; 1];
        match bus.write_read(I2C_ADDR_MAX30102, &[REG_PART_ID], &mut buf, I2C_TIMEOUT_TICKS) {
            Ok(()) => buf[0] == PART_ID_EXPECTED,
            Err(_) => false,
        }
    }

    /// Reset the sensor and configure it for heart-rate mode.
    ///
    /// Sequence is fixed: reset, 100 ms settle, sample-rate/resolution word,
    /// both LED drive currents, operating mode. Any failed write leaves the
    /// driver uninitialized; there is no automatic retry.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let result = self.configure();
        match &result {
            Ok(()) => {
                self.health.initialized = true;
                self.health.last_error = None;
                log::info!("MAX30102 initialised (HR mode, 400Hz/16-bit, max LED drive)");
            }
            Err(e) => {
                self.health.initialized = false;
                self.health.last_error = Some(e.to_string());
                log::error!("{}", e);
            }
        }
        result
    }

    fn configure(&self) -> Result<(), SensorError> {
        self.write_reg(REG_MODE_CONFIG, MODE_RESET)?;
        std::thread::sleep(std::time::Duration::from_millis(SENSOR_SETTLE_MS));

        self.write_reg(REG_SPO2_CONFIG, SPO2_CONFIG_400HZ_16BIT)?;
        self.write_reg(REG_LED1_PA, LED_CURRENT_MAX)?;
        self.write_reg(REG_LED2_PA, LED_CURRENT_MAX)?;
        self.write_reg(REG_MODE_CONFIG, MODE_HEART_RATE)?;
        Ok(())
    }

    fn write_reg(&self, reg: u8, value: u8) -> Result<(), SensorError> {
        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_MAX30102, &[reg, value], I2C_TIMEOUT_TICKS)
            .map_err(SensorError::InitFailure)
    }

    /// Drain one red/IR pair from the FIFO.
    ///
    /// Block-reads 6 bytes and decodes two big-endian 24-bit values, red
    /// first. Callers substitute a zeroed sample on failure — a zero IR
    /// reading means "no detectable signal", never a valid low.
    pub fn read_fifo(&self) -> Result<RawSample, SensorError> {
        let mut bus = self.bus.lock().unwrap();
        let mut raw = [0u8; 6];
        bus.write_read(I2C_ADDR_MAX30102, &[REG_FIFO_DATA], &mut raw, I2C_TIMEOUT_TICKS)
            .map_err(SensorError::ReadFailure)?;

        Ok(RawSample {
            red: u32::from(raw[0]) << 16 | u32::from(raw[1]) << 8 | u32::from(raw[2]),
            ir: u32::from(raw[3]) << 16 | u32::from(raw[4]) << 8 | u32::from(raw[5]),
        })
    }

    pub fn health(&self) -> &SensorHealth {
        &self.health
    }
}
