use std::io::Read;
use std::time::Duration;

use serde::Deserialize;

use crate::detection::Prediction;
use crate::error::Result;

#[derive(Deserialize, Debug)]
struct FrameRecord {
    time: Option<f64>,
    #[serde(default)]
    predictions: Vec<Prediction>,
    error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inference {
    Predictions(Vec<Prediction>),
    /// The inference call failed or its response could not be read.
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub time: Duration,
    pub inference: Inference,
}

/// Recorded inference responses, one JSON object per line.
pub struct FrameSource {
    lines: Vec<String>,
    fps: f64,
}

impl FrameSource {
    pub fn from_path(path: &str, fps: f64) -> Result<Self> {
        let contents = if path == "-" {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        } else {
            std::fs::read_to_string(path)?
        };

        Ok(Self::parse(&contents, fps))
    }

    pub fn parse(contents: &str, fps: f64) -> Self {
        let lines = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();

        Self { lines, fps }
    }

    pub fn n_frames(&self) -> usize {
        self.lines.len()
    }

    pub fn frames(&self) -> impl Iterator<Item = Frame> + '_ {
        self.lines
            .iter()
            .enumerate()
            .map(|(index, line)| parse_frame(index, line, self.fps))
    }
}

fn parse_frame(index: usize, line: &str, fps: f64) -> Frame {
    // saturates when the frame rate is too small for the index
    let fallback_time = to_duration(index as f64 / fps).unwrap_or(Duration::MAX);

    let record = match serde_json::from_str::<FrameRecord>(line) {
        Ok(record) => record,
        Err(err) => {
            return Frame {
                time: fallback_time,
                inference: Inference::Unavailable(format!("unreadable response: {err}")),
            };
        }
    };

    let time = match record.time.map(to_duration) {
        Some(Some(time)) => time,
        Some(None) => {
            tracing::warn!(
                frame = index,
                time = ?record.time,
                "timestamp out of range, using frame index"
            );
            fallback_time
        }
        None => fallback_time,
    };

    let inference = match record.error {
        Some(err) => Inference::Unavailable(err),
        None => Inference::Predictions(record.predictions),
    };

    Frame { time, inference }
}

/// Seconds to a duration, clamping negatives to zero. `None` when the value
/// does not fit.
fn to_duration(seconds: f64) -> Option<Duration> {
    if seconds <= 0.0 {
        return Some(Duration::ZERO);
    }

    Duration::try_from_secs_f64(seconds).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_predictions_and_timestamps() {
        let source = FrameSource::parse(
            r#"{"time": 2.5, "predictions": [{"class": "fall", "confidence": 0.9}]}

{"predictions": []}"#,
            4.0,
        );

        let frames: Vec<Frame> = source.frames().collect();
        assert_eq!(source.n_frames(), 2);
        assert_eq!(frames[0].time, Duration::from_millis(2500));
        assert!(matches!(&frames[0].inference, Inference::Predictions(p) if p.len() == 1));

        // second non-empty line, no timestamp
        assert_eq!(frames[1].time, Duration::from_millis(250));
        assert_eq!(frames[1].inference, Inference::Predictions(vec![]));
    }

    #[test]
    fn error_and_garbage_lines_are_unavailable() {
        let source = FrameSource::parse(
            "{\"error\": \"inference timed out\"}\nnot json\n",
            30.0,
        );

        let frames: Vec<Frame> = source.frames().collect();
        assert_eq!(
            frames[0].inference,
            Inference::Unavailable("inference timed out".to_string())
        );
        assert!(matches!(frames[1].inference, Inference::Unavailable(_)));
    }

    #[test]
    fn negative_time_clamps_to_zero() {
        let source = FrameSource::parse(r#"{"time": -4}"#, 30.0);
        let frame = source.frames().next().unwrap();

        assert_eq!(frame.time, Duration::ZERO);
    }

    #[test]
    fn oversized_time_falls_back_to_frame_index() {
        let source = FrameSource::parse(
            "{\"predictions\": []}\n{\"time\": 1e30, \"predictions\": []}\n{\"time\": 3}",
            2.0,
        );

        let frames: Vec<Frame> = source.frames().collect();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[1].time, Duration::from_millis(500));
        assert_eq!(frames[1].inference, Inference::Predictions(vec![]));
        assert_eq!(frames[2].time, Duration::from_secs(3));
    }

    #[test]
    fn tiny_frame_rate_saturates() {
        let source = FrameSource::parse("{}\n{}", 1e-300);
        let frames: Vec<Frame> = source.frames().collect();

        assert_eq!(frames[0].time, Duration::ZERO);
        assert_eq!(frames[1].time, Duration::MAX);
    }
}
