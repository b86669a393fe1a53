use crate::frames::Frame;

pub mod fall;
pub mod outage;

pub trait Analyser {
    fn analyse(&mut self, label: &str, frame_counter: usize, frame: &Frame);
    fn finish(&mut self, label: &str) -> u8;
    fn json(&self) -> Option<(String, serde_json::Value)> {
        None
    }
}
