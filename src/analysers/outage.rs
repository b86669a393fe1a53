use std::time::Duration;

use serde::Serialize;

use super::Analyser;
use crate::frames::{Frame, Inference};
use crate::{output, output::fmt_time};

#[derive(Debug, Clone, Default)]
pub struct OutageState {
    pub run_length: usize,
    pub run_start_frame: usize,
    pub run_start_time: Duration,
    pub last_time: Duration,
}

#[derive(Serialize)]
pub struct OutageSegment {
    #[serde(rename = "startFrame")]
    pub start_frame: usize,
    #[serde(rename = "endFrame")]
    pub end_frame: usize,
    pub frames: usize,
    pub start: f64,
    pub end: f64,
}

/// Reports runs of consecutive frames whose inference call failed.
pub struct OutageAnalyser {
    min_frames: usize,
    state: OutageState,
    unavailable: usize,
    segments: Vec<OutageSegment>,
}

impl OutageAnalyser {
    pub fn new(min_frames: usize) -> Self {
        Self {
            min_frames: min_frames.max(1),
            state: OutageState::default(),
            unavailable: 0,
            segments: Vec::new(),
        }
    }

    fn close_run(&mut self, label: &str, end_frame: usize) {
        let state = std::mem::take(&mut self.state);
        if state.run_length < self.min_frames {
            return;
        }

        output!(
            "[{}] OUTAGE       : {} frames without inference {} -> {}",
            label,
            state.run_length,
            fmt_time(state.run_start_time),
            fmt_time(state.last_time)
        );

        self.segments.push(OutageSegment {
            start_frame: state.run_start_frame,
            end_frame,
            frames: state.run_length,
            start: state.run_start_time.as_secs_f64(),
            end: state.last_time.as_secs_f64(),
        });
    }
}

impl Analyser for OutageAnalyser {
    fn analyse(&mut self, label: &str, frame_counter: usize, frame: &Frame) {
        match &frame.inference {
            Inference::Unavailable(reason) => {
                self.unavailable += 1;
                tracing::warn!(frame = label, %reason, "inference unavailable");

                if self.state.run_length == 0 {
                    self.state.run_start_frame = frame_counter;
                    self.state.run_start_time = frame.time;
                }
                self.state.run_length += 1;
                self.state.last_time = frame.time;
            }
            Inference::Predictions(_) => {
                if self.state.run_length > 0 {
                    self.close_run(label, frame_counter);
                }
            }
        }
    }

    fn finish(&mut self, label: &str) -> u8 {
        if self.state.run_length > 0 {
            let end_frame = self.state.run_start_frame + self.state.run_length;
            self.close_run(label, end_frame);
        }

        if self.unavailable > 0 {
            output!(
                "[{}] INFERENCE    : {} frames without a result",
                label,
                self.unavailable
            );
        }

        if self.segments.is_empty() {
            0
        } else {
            crate::ERR_CONTAINS_OUTAGE
        }
    }

    fn json(&self) -> Option<(String, serde_json::Value)> {
        if self.segments.is_empty() {
            return None;
        }

        let analysis = serde_json::json!({
            "results": self.segments,
            "threshold": self.min_frames,
            "unavailable": self.unavailable,
        });

        Some(("outages".to_string(), analysis))
    }
}
