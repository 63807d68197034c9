// MirrorPulse — Hardware & System Configuration
// Target: Seeed Studio Xiao ESP32-C3 (RISC-V)

// ---------------------------------------------------------------------------
// GPIO Pin Definitions (Xiao ESP32-C3 pinout)
// ---------------------------------------------------------------------------
pub const PIN_I2C_SDA: i32 = 6; // D4 — I2C data line
pub const PIN_I2C_SCL: i32 = 7; // D5 — I2C clock line

// ---------------------------------------------------------------------------
// I2C Bus
// ---------------------------------------------------------------------------
pub const I2C_ADDR_MAX30102: u8 = 0x57;
pub const I2C_ADDR_OLED: u8 = 0x3C;
pub const I2C_TIMEOUT_TICKS: u32 = 1000; // FreeRTOS ticks

// ---------------------------------------------------------------------------
// Display (SSD1306 OLED)
// ---------------------------------------------------------------------------
pub const SCREEN_WIDTH: u32 = 128;
pub const SCREEN_HEIGHT: u32 = 64;
pub const DISPLAY_BUFFER_SIZE: usize = (SCREEN_WIDTH as usize * SCREEN_HEIGHT as usize) / 8; // 1024

// ---------------------------------------------------------------------------
// Task Stack Sizes (bytes)
// ---------------------------------------------------------------------------
pub const STACK_SENSOR: usize = 4096;
pub const STACK_UI: usize = 8192;

// ---------------------------------------------------------------------------
// Timing (milliseconds)
// ---------------------------------------------------------------------------
pub const HR_SAMPLE_INTERVAL_MS: u64 = 100; // 10 Hz FIFO poll
pub const UI_POLL_INTERVAL_MS: u64 = 10; // 100 Hz event drain
pub const SENSOR_SETTLE_MS: u64 = 100; // post-reset settle time
pub const BOOT_SPLASH_MS: u64 = 1000; // splash screen duration

// ---------------------------------------------------------------------------
// Heart-Rate Detection
// ---------------------------------------------------------------------------
pub const IR_HISTORY_LEN: usize = 25; // baseline window (2.5 s @ 10 Hz)
pub const THRESHOLD_WINDOW: usize = 10; // samples used for the percentile
pub const THRESHOLD_PERCENTILE: f64 = 80.0;
pub const THRESHOLD_MARGIN: f64 = 1.1;
pub const FALLBACK_THRESHOLD: f64 = 30_000.0; // until the window fills
pub const REFRACTORY_MS: u32 = 250; // 240 BPM physiological ceiling
pub const BPM_MIN: u16 = 40; // plausibility band (inclusive)
pub const BPM_MAX: u16 = 200;
pub const BPM_HISTORY_LEN: usize = 5; // smoothing window (beats)

// ---------------------------------------------------------------------------
// Display Debounce
// ---------------------------------------------------------------------------
pub const DISPLAY_HOLD_MS: u32 = 5000; // min time between surfaced values
pub const DISPLAY_CLEAR_MS: u32 = 3000; // surfaced value lifetime
pub const IDLE_PROMPT_MS: u32 = 5000; // no beat for this long → finger prompt
