// MirrorPulse — Heart-Rate Pipeline
//
// Pure signal processing: raw IR intensity stream → discrete beats →
// smoothed BPM. No hardware access; timestamps are injected as plain
// milliseconds so every stage is deterministic and testable.

use crate::config::*;

// ---------------------------------------------------------------------------
// Fixed-capacity history ring
// ---------------------------------------------------------------------------

/// Overwrite-oldest ring buffer. Constant memory, O(1) insertion — the
/// pipeline runs indefinitely on a small heap.
pub struct History<T: Copy + Default, const N: usize> {
    buf: [T; N],
    idx: usize,
    count: usize,
}

impl<T: Copy + Default, const N: usize> History<T, N> {
    pub fn new() -> Self {
        Self {
            buf: [T::default(); N],
            idx: 0,
            count: 0,
        }
    }

    pub fn push(&mut self, value: T) {
        self.buf[self.idx] = value;
        self.idx = (self.idx + 1) % N;
        if self.count < N {
            self.count += 1;
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    /// The `n` most recent entries, oldest → newest. Shorter if fewer exist.
    pub fn recent(&self, n: usize) -> Vec<T> {
        let take = self.count.min(n);
        let start = if self.count < N { 0 } else { self.idx };
        (self.count - take..self.count)
            .map(|i| self.buf[(start + i) % N])
            .collect()
    }
}

impl<T: Copy + Default, const N: usize> Default for History<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Adaptive peak detection
// ---------------------------------------------------------------------------

/// A detected pulse: when it happened and the instantaneous BPM implied by
/// the interval since the previous beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BeatEvent {
    pub at_ms: u32,
    pub bpm: u16,
}

/// Turns the raw IR stream into beat events.
///
/// The threshold rides an 80th-percentile of the recent baseline so it
/// tracks drift in ambient light and finger pressure; the refractory period
/// stops a single pulse's rising edge from double-counting.
pub struct PeakDetector {
    ir_history: History<u32, IR_HISTORY_LEN>,
    last_beat_ms: Option<u32>,
}

impl PeakDetector {
    pub fn new() -> Self {
        Self {
            ir_history: History::new(),
            last_beat_ms: None,
        }
    }

    /// Current detection threshold in raw ADC counts.
    ///
    /// Fixed fallback until the percentile window has filled.
    pub fn threshold(&self) -> f64 {
        if self.ir_history.len() < THRESHOLD_WINDOW {
            return FALLBACK_THRESHOLD;
        }
        let mut window = self.ir_history.recent(THRESHOLD_WINDOW);
        window.sort_unstable();
        percentile(&window, THRESHOLD_PERCENTILE) * THRESHOLD_MARGIN
    }

    /// Feed one IR sample. Returns a beat only when it is physiologically
    /// plausible; an implausible interval still advances the refractory
    /// clock so a spurious edge after a long silence cannot chain.
    pub fn update(&mut self, ir: u32, now_ms: u32) -> Option<BeatEvent> {
        self.ir_history.push(ir);

        if f64::from(ir) <= self.threshold() {
            return None;
        }
        if let Some(prev) = self.last_beat_ms {
            if now_ms.wrapping_sub(prev) < REFRACTORY_MS {
                return None;
            }
        }

        let prev = self.last_beat_ms.replace(now_ms);
        // First beat only establishes the baseline timestamp.
        let prev = prev?;

        let interval_ms = now_ms.wrapping_sub(prev);
        // interval_ms ≥ REFRACTORY_MS here, so this never divides by zero
        // and never exceeds 240.
        let bpm = (60_000 / interval_ms) as u16;
        if (BPM_MIN..=BPM_MAX).contains(&bpm) {
            Some(BeatEvent { at_ms: now_ms, bpm })
        } else {
            log::debug!("discarding implausible beat: {} BPM", bpm);
            None
        }
    }
}

/// Linear-interpolated percentile over an ascending-sorted slice.
fn percentile(sorted: &[u32], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let frac = rank - lo as f64;
    let base = f64::from(sorted[lo]);
    if lo + 1 >= sorted.len() {
        base
    } else {
        base + frac * (f64::from(sorted[lo + 1]) - base)
    }
}

// ---------------------------------------------------------------------------
// BPM smoothing
// ---------------------------------------------------------------------------

/// Arithmetic mean over the last few validated beats. The short window
/// favours responsiveness: the sensor is pressed and released
/// intermittently, not worn continuously.
pub struct BpmEstimator {
    history: History<u16, BPM_HISTORY_LEN>,
}

impl BpmEstimator {
    pub fn new() -> Self {
        Self {
            history: History::new(),
        }
    }

    /// Accept one validated instantaneous BPM; returns the smoothed value.
    pub fn push(&mut self, bpm: u16) -> u16 {
        self.history.push(bpm);
        let window = self.history.recent(BPM_HISTORY_LEN);
        let sum: u32 = window.iter().map(|&v| u32::from(v)).sum();
        (sum / window.len() as u32) as u16
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Detector + estimator wired together: one IR sample in, an optional
/// smoothed BPM out. This is the only value that crosses the task boundary.
pub struct HrPipeline {
    detector: PeakDetector,
    estimator: BpmEstimator,
}

impl HrPipeline {
    pub fn new() -> Self {
        Self {
            detector: PeakDetector::new(),
            estimator: BpmEstimator::new(),
        }
    }

    pub fn process(&mut self, ir: u32, now_ms: u32) -> Option<u16> {
        let beat = self.detector.update(ir, now_ms)?;
        Some(self.estimator.push(beat.bpm))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASELINE: u32 = 20_000; // resting IR level, below the fallback
    const SPIKE: u32 = 50_000; // a clear pulse peak

    /// Feed `n` baseline samples spaced 100 ms apart starting at `t0`.
    fn warmup(det: &mut PeakDetector, n: u32, t0: u32) -> u32 {
        for i in 0..n {
            assert_eq!(det.update(BASELINE, t0 + i * 100), None);
        }
        t0 + n * 100
    }

    #[test]
    fn threshold_is_fallback_until_window_fills() {
        let mut det = PeakDetector::new();
        for i in 0..(THRESHOLD_WINDOW - 1) {
            det.update(BASELINE, i as u32 * 100);
            assert_eq!(det.threshold(), FALLBACK_THRESHOLD);
        }
        det.update(BASELINE, 1000);
        assert_ne!(det.threshold(), FALLBACK_THRESHOLD);
    }

    #[test]
    fn threshold_is_margin_times_percentile() {
        let mut det = PeakDetector::new();
        for (i, ir) in (10_000u32..=100_000).step_by(10_000).enumerate() {
            det.update(ir, i as u32 * 100);
        }
        // sorted window = [10k..100k]; rank 7.2 → 80k + 0.2·10k = 82k; ×1.1
        assert!((det.threshold() - 90_200.0).abs() < 1.0);
    }

    #[test]
    fn threshold_uses_only_the_recent_window() {
        let mut det = PeakDetector::new();
        // Old saturated samples must age out of the 10-sample window.
        for i in 0..15u32 {
            det.update(1_000_000, i * 100);
        }
        for i in 15..25u32 {
            det.update(BASELINE, i * 100);
        }
        assert!((det.threshold() - f64::from(BASELINE) * THRESHOLD_MARGIN).abs() < 1.0);
    }

    #[test]
    fn first_beat_establishes_baseline_only() {
        let mut det = PeakDetector::new();
        let t = warmup(&mut det, 10, 0);
        assert_eq!(det.update(SPIKE, t), None);
    }

    #[test]
    fn beat_interval_yields_instantaneous_bpm() {
        let mut det = PeakDetector::new();
        let t = warmup(&mut det, 10, 0); // t = 1000
        assert_eq!(det.update(SPIKE, t), None); // first beat
        let t = warmup(&mut det, 5, t + 100);
        // 600 ms since the first beat → 100 BPM
        assert_eq!(
            det.update(SPIKE, t),
            Some(BeatEvent { at_ms: t, bpm: 100 })
        );
    }

    #[test]
    fn refractory_period_suppresses_double_counting() {
        let mut det = PeakDetector::new();
        let t = warmup(&mut det, 10, 0);
        det.update(SPIKE, t);
        // 100 ms later — inside the refractory window, no event and no
        // timestamp update.
        assert_eq!(det.update(SPIKE, t + 100), None);
        let t2 = warmup(&mut det, 8, t + 200);
        // Interval measured from the *accepted* beat at `t`, not the
        // suppressed edge: 1000 ms → 60 BPM.
        assert_eq!(
            det.update(SPIKE, t2),
            Some(BeatEvent { at_ms: t2, bpm: 60 })
        );
    }

    #[test]
    fn implausible_interval_is_discarded_but_advances_the_clock() {
        let mut det = PeakDetector::new();
        let t = warmup(&mut det, 10, 0);
        det.update(SPIKE, t); // first beat at t
        // Long silence: 10 s → 6 BPM, outside [40, 200] → discarded.
        let t2 = warmup(&mut det, 20, t + 100) + 8_000;
        det.update(BASELINE, t2 - 100);
        assert_eq!(det.update(SPIKE, t2), None);
        // …but the refractory clock moved to t2: a beat 600 ms later is
        // measured against t2, not t.
        let t3 = warmup(&mut det, 5, t2 + 100);
        assert_eq!(
            det.update(SPIKE, t3),
            Some(BeatEvent { at_ms: t3, bpm: 100 })
        );
    }

    #[test]
    fn zeroed_samples_never_detect() {
        // A failed FIFO read is substituted with zeros — "no signal".
        let mut det = PeakDetector::new();
        for i in 0..50u32 {
            assert_eq!(det.update(0, i * 100), None);
        }
    }

    #[test]
    fn smoothed_bpm_is_mean_of_accepted_values() {
        let mut est = BpmEstimator::new();
        assert_eq!(est.push(72), 72);
        assert_eq!(est.push(75), 73); // (72+75)/2, truncated
        assert_eq!(est.push(78), 75);
    }

    #[test]
    fn smoothing_window_drops_oldest_beyond_capacity() {
        let mut est = BpmEstimator::new();
        for bpm in [100, 60, 60, 60, 60, 60] {
            est.push(bpm);
        }
        // The 100 has aged out of the 5-entry window.
        assert_eq!(est.push(60), 60);
    }

    #[test]
    fn pipeline_reports_only_on_accepted_beats() {
        let mut pipe = HrPipeline::new();
        let mut t = 0;
        for _ in 0..10 {
            assert_eq!(pipe.process(BASELINE, t), None);
            t += 100;
        }
        assert_eq!(pipe.process(SPIKE, t), None); // first beat — baseline only
        for _ in 0..5 {
            t += 100;
            assert_eq!(pipe.process(BASELINE, t), None);
        }
        t += 100;
        // 600 ms interval → 100 BPM, single-entry mean = 100.
        assert_eq!(pipe.process(SPIKE, t), Some(100));
    }
}
