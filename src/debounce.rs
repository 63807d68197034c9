// MirrorPulse — Display Debouncer
//
// Three-state presentation machine polled once per pipeline tick. Raw
// per-tick BPM values are too jittery to read; this holds each surfaced
// value for a fixed window, decays it to a placeholder, and escalates to a
// "place finger" prompt when the sensor has clearly been released.
//
//   IDLE --reading, hold elapsed--> FRESH --clear deadline--> IDLE

use crate::config::*;
use crate::events::DisplayView;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Fresh,
}

pub struct DisplayDebouncer {
    state: State,
    /// When the currently/last surfaced value went up.
    last_emitted_at: Option<u32>,
    /// Last time any smoothed reading arrived, surfaced or suppressed.
    last_reading_at: Option<u32>,
    /// Baseline for the idle prompt before the first reading ever.
    idle_since: u32,
    prompt_shown: bool,
}

impl DisplayDebouncer {
    pub fn new(now_ms: u32) -> Self {
        Self {
            state: State::Idle,
            last_emitted_at: None,
            last_reading_at: None,
            idle_since: now_ms,
            prompt_shown: false,
        }
    }

    /// Feed one tick. Returns a view only when the visible display should
    /// change; `None` means leave whatever is showing alone.
    pub fn tick(&mut self, reading: Option<u16>, now_ms: u32) -> Option<DisplayView> {
        if let Some(bpm) = reading {
            self.last_reading_at = Some(now_ms);

            let held = self
                .last_emitted_at
                .map(|t| now_ms.wrapping_sub(t) <= DISPLAY_HOLD_MS)
                .unwrap_or(false);
            if !held {
                // Supersedes any pending clear deadline.
                self.state = State::Fresh;
                self.last_emitted_at = Some(now_ms);
                self.prompt_shown = false;
                return Some(DisplayView::Bpm(bpm));
            }
            // Inside the hold window: smoothing continues upstream, the
            // visible value does not move.
        }

        match self.state {
            State::Fresh => {
                let shown_at = self.last_emitted_at.unwrap_or(self.idle_since);
                if now_ms.wrapping_sub(shown_at) >= DISPLAY_CLEAR_MS {
                    self.state = State::Idle;
                    return Some(DisplayView::Waiting);
                }
                None
            }
            State::Idle => {
                let last = self.last_reading_at.unwrap_or(self.idle_since);
                if !self.prompt_shown && now_ms.wrapping_sub(last) > IDLE_PROMPT_MS {
                    self.prompt_shown = true;
                    return Some(DisplayView::PlaceFinger);
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reading_is_surfaced_immediately() {
        let mut d = DisplayDebouncer::new(0);
        assert_eq!(d.tick(Some(80), 0), Some(DisplayView::Bpm(80)));
    }

    #[test]
    fn hold_window_suppresses_then_releases() {
        let mut d = DisplayDebouncer::new(0);
        assert_eq!(d.tick(Some(80), 0), Some(DisplayView::Bpm(80)));
        // 2 s later: still held, display unchanged.
        assert_eq!(d.tick(Some(90), 2_000), None);
        // 6 s later: hold elapsed, new value goes up.
        assert_eq!(d.tick(Some(85), 6_000), Some(DisplayView::Bpm(85)));
        // …and the clear timer restarted from 6 s.
        assert_eq!(d.tick(None, 8_900), None);
        assert_eq!(d.tick(None, 9_000), Some(DisplayView::Waiting));
    }

    #[test]
    fn surfaced_value_clears_after_deadline() {
        let mut d = DisplayDebouncer::new(0);
        d.tick(Some(80), 0);
        assert_eq!(d.tick(None, 1_000), None);
        assert_eq!(d.tick(None, 3_000), Some(DisplayView::Waiting));
        // Clear fires once.
        assert_eq!(d.tick(None, 3_100), None);
    }

    #[test]
    fn clear_fires_even_while_beats_keep_arriving() {
        let mut d = DisplayDebouncer::new(0);
        d.tick(Some(80), 0);
        assert_eq!(d.tick(Some(82), 1_000), None);
        // Suppressed reading does not keep the value alive past the clear.
        assert_eq!(d.tick(Some(81), 3_000), Some(DisplayView::Waiting));
        // Hold window measured from the emission, not the clear.
        assert_eq!(d.tick(Some(83), 5_100), Some(DisplayView::Bpm(83)));
    }

    #[test]
    fn idle_prompt_after_five_seconds_without_beats() {
        let mut d = DisplayDebouncer::new(0);
        assert_eq!(d.tick(None, 5_000), None); // not yet — strictly more than 5 s
        assert_eq!(d.tick(None, 5_100), Some(DisplayView::PlaceFinger));
        // Prompt is shown once per idle stretch, not re-emitted every tick.
        assert_eq!(d.tick(None, 6_000), None);
    }

    #[test]
    fn prompt_follows_a_decayed_reading() {
        let mut d = DisplayDebouncer::new(0);
        d.tick(Some(80), 0);
        assert_eq!(d.tick(None, 3_000), Some(DisplayView::Waiting));
        // Last beat was at t=0 → prompt strictly after t=5 s.
        assert_eq!(d.tick(None, 4_900), None);
        assert_eq!(d.tick(None, 5_100), Some(DisplayView::PlaceFinger));
        // A new reading recovers the display and re-arms the prompt.
        assert_eq!(d.tick(Some(75), 6_000), Some(DisplayView::Bpm(75)));
    }
}
