// MirrorPulse — SSD1306 OLED Driver
//
// Command-level driver over the shared I2C bus with an in-memory
// framebuffer rendered through embedded-graphics. Shows the debounced
// heart-rate views plus the one-shot sensor status line.

use core::convert::Infallible;

use embedded_graphics::{
    mono_font::{
        ascii::{FONT_10X20, FONT_6X10},
        MonoTextStyle,
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::{Alignment, Text},
};

use crate::config::*;
use crate::drivers::SharedBus;
use crate::events::{DisplayView, SensorStatus};

// SSD1306 control bytes
const CTRL_COMMAND: u8 = 0x00;
const CTRL_DATA: u8 = 0x40;

// Init sequence for a 128x64 panel (horizontal addressing, charge pump on).
const INIT_SEQUENCE: &[u8] = &[
    0xAE, // display off
    0xD5, 0x80, // clock divide
    0xA8, 0x3F, // multiplex 64
    0xD3, 0x00, // display offset
    0x40, // start line 0
    0x8D, 0x14, // charge pump on
    0x20, 0x00, // horizontal addressing
    0xA1, // segment remap
    0xC8, // COM scan direction
    0xDA, 0x12, // COM pins
    0x81, 0xCF, // contrast
    0xD9, 0xF1, // precharge
    0xDB, 0x40, // VCOMH
    0xA4, // resume from RAM
    0xA6, // normal (non-inverted)
    0xAF, // display on
];

// ---------------------------------------------------------------------------
// Framebuffer
// ---------------------------------------------------------------------------

/// Page-addressed 1-bit framebuffer matching the SSD1306 RAM layout.
struct Frame {
    buf: [u8; DISPLAY_BUFFER_SIZE],
}

impl Frame {
    fn new() -> Self {
        Self {
            buf: [0; DISPLAY_BUFFER_SIZE],
        }
    }

    fn clear(&mut self) {
        self.buf.fill(0);
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(SCREEN_WIDTH, SCREEN_HEIGHT)
    }
}

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if (0..SCREEN_WIDTH as i32).contains(&point.x)
                && (0..SCREEN_HEIGHT as i32).contains(&point.y)
            {
                let idx = (point.y as usize / 8) * SCREEN_WIDTH as usize + point.x as usize;
                let bit = 1u8 << (point.y as usize % 8);
                match color {
                    BinaryColor::On => self.buf[idx] |= bit,
                    BinaryColor::Off => self.buf[idx] &= !bit,
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

pub struct OledDisplay {
    bus: SharedBus,
    frame: Frame,
    status: Option<SensorStatus>,
    view: Option<DisplayView>,
}

impl OledDisplay {
    pub fn new(bus: SharedBus) -> Self {
        Self {
            bus,
            frame: Frame::new(),
            status: None,
            view: None,
        }
    }

    /// Verify the panel ACKs on the bus.
    pub fn is_connected(&self) -> bool {
        let mut bus = self.bus.lock().unwrap();
        // 0xE3 = NOP command
        bus.write(I2C_ADDR_OLED, &[CTRL_COMMAND, 0xE3], I2C_TIMEOUT_TICKS)
            .is_ok()
    }

    pub fn init(&mut self) -> anyhow::Result<()> {
        self.send_commands(INIT_SEQUENCE)?;
        self.frame.clear();
        self.flush()?;
        log::info!("SSD1306 initialised");
        Ok(())
    }

    /// Boot splash with the product name.
    pub fn show_splash(&mut self) -> anyhow::Result<()> {
        self.frame.clear();
        let style = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);
        Text::with_alignment("MirrorPulse", Point::new(64, 38), style, Alignment::Center)
            .draw(&mut self.frame)?;
        self.flush()
    }

    /// Component self-test results during boot.
    pub fn show_boot_status(&mut self, oled_ok: bool, sensor_ok: bool) -> anyhow::Result<()> {
        self.frame.clear();
        let style = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let oled_line = if oled_ok { "OLED: OK" } else { "OLED: FAIL" };
        let hr_line = if sensor_ok { "HR sensor: OK" } else { "HR sensor: FAIL" };
        Text::new(oled_line, Point::new(4, 24), style).draw(&mut self.frame)?;
        Text::new(hr_line, Point::new(4, 40), style).draw(&mut self.frame)?;
        self.flush()
    }

    /// Record the startup status line and redraw.
    pub fn show_status(&mut self, status: SensorStatus) -> anyhow::Result<()> {
        self.status = Some(status);
        self.redraw()
    }

    /// Show a debounced heart-rate view.
    pub fn show_view(&mut self, view: DisplayView) -> anyhow::Result<()> {
        self.view = Some(view);
        self.redraw()
    }

    fn redraw(&mut self) -> anyhow::Result<()> {
        self.frame.clear();
        let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let large = MonoTextStyle::new(&FONT_10X20, BinaryColor::On);

        if let Some(status) = self.status {
            Text::new(status.label(), Point::new(2, 10), small).draw(&mut self.frame)?;
        }

        match self.view {
            Some(DisplayView::Bpm(bpm)) => {
                let value = format!("{} BPM", bpm);
                Text::with_alignment(&value, Point::new(64, 40), large, Alignment::Center)
                    .draw(&mut self.frame)?;
                Text::with_alignment(zone_label(bpm), Point::new(64, 58), small, Alignment::Center)
                    .draw(&mut self.frame)?;
            }
            Some(DisplayView::Waiting) => {
                Text::with_alignment("-- BPM", Point::new(64, 40), large, Alignment::Center)
                    .draw(&mut self.frame)?;
                Text::with_alignment("Waiting...", Point::new(64, 58), small, Alignment::Center)
                    .draw(&mut self.frame)?;
            }
            Some(DisplayView::PlaceFinger) => {
                Text::with_alignment("-- BPM", Point::new(64, 36), large, Alignment::Center)
                    .draw(&mut self.frame)?;
                Text::with_alignment("Place finger", Point::new(64, 50), small, Alignment::Center)
                    .draw(&mut self.frame)?;
                Text::with_alignment("on sensor", Point::new(64, 61), small, Alignment::Center)
                    .draw(&mut self.frame)?;
            }
            None => {}
        }

        self.flush()
    }

    fn send_commands(&mut self, commands: &[u8]) -> anyhow::Result<()> {
        let mut bus = self.bus.lock().unwrap();
        for &cmd in commands {
            bus.write(I2C_ADDR_OLED, &[CTRL_COMMAND, cmd], I2C_TIMEOUT_TICKS)?;
        }
        Ok(())
    }

    /// Push the framebuffer to the panel in one data burst.
    fn flush(&mut self) -> anyhow::Result<()> {
        self.send_commands(&[0x21, 0x00, 0x7F, 0x22, 0x00, 0x07])?;

        let mut payload = Vec::with_capacity(1 + DISPLAY_BUFFER_SIZE);
        payload.push(CTRL_DATA);
        payload.extend_from_slice(&self.frame.buf);

        let mut bus = self.bus.lock().unwrap();
        bus.write(I2C_ADDR_OLED, &payload, I2C_TIMEOUT_TICKS)?;
        Ok(())
    }
}

/// Low/normal/high zone label shown under the BPM value.
fn zone_label(bpm: u16) -> &'static str {
    if bpm < 60 {
        "Low"
    } else if bpm > 100 {
        "High"
    } else {
        "Normal"
    }
}
