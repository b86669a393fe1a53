use std::time::Duration;

use clap::Parser;

use crate::debouncer::{
    DEFAULT_ALERT_RATIO, DEFAULT_CAPACITY, DEFAULT_MIN_SAMPLES, DebouncerConfig,
};
use crate::error::{Error, Result};

#[derive(Parser, Debug)]
#[command(version, about = "Replays recorded fall-detection inference and reports debounced alerts")]
pub struct Cli {
    /// Recorded inference responses, one JSON object per line ("-" for stdin)
    pub input: String,

    /// Number of recent frames kept in the debounce window
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub capacity: usize,

    /// Frames required in the window before an alert can fire
    #[arg(long, default_value_t = DEFAULT_MIN_SAMPLES)]
    pub min_samples: usize,

    /// Share of positive frames that must be exceeded to alert
    #[arg(long, default_value_t = DEFAULT_ALERT_RATIO)]
    pub alert_ratio: f32,

    /// Seconds between two alerts
    #[arg(long, default_value_t = 60.0)]
    pub cooldown: f64,

    /// Minimum prediction confidence for a fall (exclusive)
    #[arg(long, default_value_t = crate::detection::DEFAULT_CONFIDENCE_THRESHOLD)]
    pub confidence: f64,

    /// Frame rate used for frames without a timestamp
    #[arg(long, default_value_t = 30.0)]
    pub fps: f64,

    /// Consecutive frames without inference reported as an outage
    #[arg(long, default_value_t = 10)]
    pub outage_frames: usize,

    /// Phone number alerts are sent to
    #[arg(long, env = "RECIPIENT_PHONE_NUMBER")]
    pub recipient: Option<String>,

    /// Phone number alerts are sent from
    #[arg(long, env = "TWILIO_PHONE_NUMBER")]
    pub sender: Option<String>,

    /// Write the analysis to this JSON file
    #[arg(long)]
    pub json: Option<String>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Only set the exit code
    #[arg(short, long)]
    pub quiet: bool,

    /// Log every frame
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    pub fn debouncer_config(&self) -> Result<DebouncerConfig> {
        let cooldown = Duration::try_from_secs_f64(self.cooldown).map_err(|_| {
            Error::InvalidConfig(format!(
                "cooldown must be a non-negative number of seconds, got {}",
                self.cooldown
            ))
        })?;

        let config = DebouncerConfig {
            capacity: self.capacity,
            min_samples: self.min_samples,
            alert_ratio: self.alert_ratio,
            cooldown,
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_debouncer_defaults() {
        let cli = Cli::try_parse_from(["fallwatch", "frames.jsonl"]).unwrap();

        assert_eq!(cli.debouncer_config().unwrap(), DebouncerConfig::default());
        assert_eq!(cli.confidence, 0.5);
        assert_eq!(cli.input, "frames.jsonl");
    }

    #[test]
    fn overrides_thresholds() {
        let cli = Cli::try_parse_from([
            "fallwatch",
            "-",
            "--capacity",
            "8",
            "--min-samples",
            "4",
            "--cooldown",
            "1.5",
        ])
        .unwrap();

        let config = cli.debouncer_config().unwrap();
        assert_eq!(config.capacity, 8);
        assert_eq!(config.min_samples, 4);
        assert_eq!(config.cooldown, Duration::from_millis(1500));
    }

    #[test]
    fn rejects_unusable_cooldowns() {
        let cooldowns = [
            "--cooldown=-60",
            "--cooldown=NaN",
            "--cooldown=1e30",
            "--cooldown=inf",
        ];
        for cooldown in cooldowns {
            let cli = Cli::try_parse_from(["fallwatch", "-", cooldown]).unwrap();
            assert!(
                matches!(cli.debouncer_config(), Err(Error::InvalidConfig(_))),
                "{cooldown} accepted"
            );
        }
    }

    #[test]
    fn zero_cooldown_is_allowed() {
        let cli = Cli::try_parse_from(["fallwatch", "-", "--cooldown", "0"]).unwrap();

        assert_eq!(cli.debouncer_config().unwrap().cooldown, Duration::ZERO);
    }

    #[test]
    fn rejects_invalid_window() {
        let cli = Cli::try_parse_from(["fallwatch", "-", "--min-samples", "9"]).unwrap();

        assert!(cli.debouncer_config().is_err());
    }
}
