use serde::Serialize;

use super::Analyser;
use crate::clock::ManualClock;
use crate::debouncer::{AlertDebouncer, DebouncerConfig};
use crate::detection::classify;
use crate::error::Result;
use crate::frames::{Frame, Inference};
use crate::notify::{Alert, DispatchStats, Dispatcher};
use crate::{output, output::fmt_time};

#[derive(Serialize)]
pub struct AlertRecord {
    pub frame: usize,
    pub time: f64,
    pub ratio: f32,
    #[serde(rename = "windowLen")]
    pub window_len: usize,
    pub delivered: bool,
}

/// Feeds per-frame fall detections through the debouncer and hands the
/// resulting alerts to the dispatcher. Frame timestamps drive the clock, so a
/// replay honours the cooldown in recorded time.
pub struct FallAnalyser {
    debouncer: AlertDebouncer<ManualClock>,
    clock: ManualClock,
    confidence: f64,
    dispatcher: Dispatcher,
    alerts: Vec<AlertRecord>,
    detections: usize,
    stats: DispatchStats,
}

impl FallAnalyser {
    pub fn new(config: DebouncerConfig, confidence: f64, dispatcher: Dispatcher) -> Result<Self> {
        let clock = ManualClock::new();
        let debouncer = AlertDebouncer::new(config, clock.clone())?;

        Ok(Self {
            debouncer,
            clock,
            confidence,
            dispatcher,
            alerts: Vec::new(),
            detections: 0,
            stats: DispatchStats::default(),
        })
    }
}

impl Analyser for FallAnalyser {
    fn analyse(&mut self, label: &str, frame_counter: usize, frame: &Frame) {
        let Inference::Predictions(predictions) = &frame.inference else {
            // no sample for this frame, the window is left as it was
            return;
        };

        self.clock.set(frame.time);

        let detected = classify(predictions, self.confidence);
        if detected {
            self.detections += 1;
            for pred in predictions.iter().filter(|p| p.is_fall(self.confidence)) {
                tracing::debug!(
                    frame = label,
                    class = %pred.class_name,
                    confidence = pred.confidence,
                    bbox = ?pred.bounding_box(),
                    "fall prediction"
                );
            }
        }

        let decision = self.debouncer.observe(detected);
        tracing::debug!(
            frame = label,
            detected,
            ratio = decision.ratio,
            window = decision.window_len,
            "observed"
        );

        if !decision.is_alert() {
            return;
        }

        output!(
            "[{}] ALERT        : ratio {:.3} over {} samples @ {}",
            label,
            decision.ratio,
            decision.window_len,
            fmt_time(frame.time)
        );

        self.alerts.push(AlertRecord {
            frame: frame_counter,
            time: frame.time.as_secs_f64(),
            ratio: decision.ratio,
            window_len: decision.window_len,
            delivered: false,
        });
        self.dispatcher.dispatch(Alert {
            frame: frame_counter,
            time: frame.time,
            ratio: decision.ratio,
        });
    }

    fn finish(&mut self, label: &str) -> u8 {
        self.stats = self.dispatcher.finish();
        for alert in self.alerts.iter_mut() {
            alert.delivered = self.stats.delivered.contains(&alert.frame);
        }

        output!(
            "[{}] FALLS        : {} detection frames, {} alerts ({} delivered, {} failed)",
            label,
            self.detections,
            self.alerts.len(),
            self.stats.delivered.len(),
            self.stats.failed.len()
        );

        let mut code = 0;
        if !self.alerts.is_empty() {
            code |= crate::ERR_CONTAINS_ALERT;
        }
        if !self.stats.failed.is_empty() {
            code |= crate::ERR_NOTIFICATION_FAILED;
        }
        code
    }

    fn json(&self) -> Option<(String, serde_json::Value)> {
        let config = self.debouncer.config();
        let analysis = serde_json::json!({
            "results": self.alerts,
            "detections": self.detections,
            "capacity": config.capacity,
            "minSamples": config.min_samples,
            "alertRatio": config.alert_ratio,
            "cooldown": config.cooldown.as_secs_f64(),
            "confidence": self.confidence,
        });

        Some(("alerts".to_string(), analysis))
    }
}
