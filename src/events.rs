// MirrorPulse — System Events & Data Types

// ---------------------------------------------------------------------------
// Raw Sample (one red/IR pair drained from the MAX30102 FIFO)
// ---------------------------------------------------------------------------
/// Both channels are 24-bit unsigned ADC counts. A zeroed sample means
/// "no detectable signal" (also substituted on a failed FIFO read), never a
/// valid physiological low.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawSample {
    pub red: u32,
    pub ir: u32,
}

// ---------------------------------------------------------------------------
// Sensor Status
// ---------------------------------------------------------------------------
/// Reported once at startup and never revised automatically; a dead sensor
/// stays dead until an explicit re-init (i.e. a reboot).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorStatus {
    Ready,
    Unavailable,
}

impl SensorStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Sensor: Ready",
            Self::Unavailable => "Sensor: Not Available",
        }
    }
}

// ---------------------------------------------------------------------------
// Display Views — what the OLED is currently showing
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayView {
    /// A debounced BPM value.
    Bpm(u16),
    /// Generic "-- BPM" placeholder after a surfaced value expired.
    Waiting,
    /// Nothing detected for a while — prompt for finger contact.
    PlaceFinger,
}

// ---------------------------------------------------------------------------
// UI Events — sent to the UI task via channel
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy)]
pub enum UiEvent {
    /// One pipeline tick completed: smoothed BPM, or `None` if no beat
    /// was accepted on that tick.
    HrTick(Option<u16>),
    /// Sensor self-test outcome (sent once, at startup).
    Status(SensorStatus),
}
