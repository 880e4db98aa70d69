use crate::keypoint::FrameInfo;
use crate::prelude::DEFAULT_FRAME_RATE;
use serde::{Deserialize, Serialize};

/// Playback position and native geometry of the loaded clip.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct VideoClock {
    pub duration: f64,
    pub frame_rate: f64,
    pub current_time: f64,
    pub paused: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for VideoClock {
    fn default() -> Self {
        Self {
            duration: 0.0,
            frame_rate: DEFAULT_FRAME_RATE,
            current_time: 0.0,
            paused: true,
            width: 0,
            height: 0,
        }
    }
}

impl VideoClock {
    pub fn new(duration: f64, frame_rate: f64, width: u32, height: u32) -> Self {
        Self {
            duration: duration.max(0.0),
            frame_rate: if frame_rate > 0.0 {
                frame_rate
            } else {
                DEFAULT_FRAME_RATE
            },
            width,
            height,
            ..Default::default()
        }
    }

    pub fn frame_duration(&self) -> f64 {
        1.0 / self.frame_rate
    }

    pub fn play(&mut self) {
        self.paused = false;
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Pauses and moves one frame ahead, never past the end of the clip.
    pub fn step_forward(&mut self) {
        self.pause();
        self.current_time = (self.current_time + self.frame_duration()).min(self.duration);
    }

    /// Pauses and moves one frame back, never before zero.
    pub fn step_backward(&mut self) {
        self.pause();
        self.current_time = (self.current_time - self.frame_duration()).max(0.0);
    }

    /// Moves the playhead while playing; returns `true` once the clip has ended.
    pub fn advance(&mut self, elapsed: f64) -> bool {
        if !self.paused {
            self.current_time = (self.current_time + elapsed.max(0.0)).min(self.duration);
        }
        self.current_time >= self.duration
    }

    pub fn frame(&self) -> FrameInfo {
        FrameInfo::new(
            (self.current_time * self.frame_rate).round() as u64,
            self.current_time,
            self.width,
            self.height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_frame_advances_one_thirtieth() {
        let mut clock = VideoClock::new(20.0, 30.0, 640, 480);
        clock.current_time = 10.0;
        clock.play();
        clock.step_forward();
        assert!((clock.current_time - 10.0333).abs() < 1e-3);
        assert!(clock.paused);
    }

    #[test]
    fn stepping_clamps_to_clip_bounds() {
        let mut clock = VideoClock::new(1.0, 30.0, 640, 480);
        clock.step_backward();
        assert_eq!(clock.current_time, 0.0);

        clock.current_time = 0.99;
        clock.step_forward();
        assert_eq!(clock.current_time, 1.0);
    }

    #[test]
    fn advance_only_moves_while_playing() {
        let mut clock = VideoClock::new(0.25, 30.0, 640, 480);
        assert!(!clock.advance(0.1));
        assert_eq!(clock.current_time, 0.0);

        clock.play();
        assert!(!clock.advance(0.1));
        assert!(clock.advance(0.2));
        assert_eq!(clock.current_time, 0.25);
    }
}
