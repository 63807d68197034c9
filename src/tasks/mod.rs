// MirrorPulse — Tasks

pub mod sensor;
pub mod ui;
