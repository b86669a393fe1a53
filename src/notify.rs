//! Alert delivery, kept off the frame loop.
//!
//! The [`Dispatcher`] owns a worker thread that drains a channel of alerts and
//! hands each one to a [`Notifier`]. A failing or slow notifier only delays
//! that worker; the frame loop keeps observing.

use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::output;

pub const ALERT_MESSAGE: &str = "ALERT: Fall detected! Immediate assistance required!";

#[derive(Debug, Clone, PartialEq)]
pub struct Alert {
    pub frame: usize,
    pub time: Duration,
    pub ratio: f32,
}

pub trait Notifier: Send {
    fn notify(&mut self, alert: &Alert) -> Result<()>;
}

/// Renders the SMS the monitoring service sends to the caregiver.
pub struct SmsNotifier {
    sender: Option<String>,
    recipient: String,
    body: String,
}

impl SmsNotifier {
    pub fn new(sender: Option<String>, recipient: String) -> Self {
        Self {
            sender,
            recipient,
            body: ALERT_MESSAGE.to_string(),
        }
    }
}

impl Notifier for SmsNotifier {
    fn notify(&mut self, _alert: &Alert) -> Result<()> {
        if self.recipient.trim().is_empty() {
            return Err(Error::Notification("no recipient number".into()));
        }

        output!(
            "SMS {} -> {}: {}",
            self.sender.as_deref().unwrap_or("-"),
            self.recipient,
            self.body
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: Vec<usize>,
    pub failed: Vec<usize>,
}

pub struct Dispatcher {
    tx: Option<Sender<Alert>>,
    worker: Option<JoinHandle<DispatchStats>>,
}

impl Dispatcher {
    pub fn spawn<N: Notifier + 'static>(mut notifier: N) -> Self {
        let (tx, rx) = mpsc::channel::<Alert>();

        let worker = thread::spawn(move || {
            let mut stats = DispatchStats::default();
            for alert in rx {
                match notifier.notify(&alert) {
                    Ok(()) => {
                        tracing::info!(frame = alert.frame, "alert delivered");
                        stats.delivered.push(alert.frame);
                    }
                    Err(err) => {
                        tracing::warn!(frame = alert.frame, %err, "alert delivery failed");
                        stats.failed.push(alert.frame);
                    }
                }
            }
            stats
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// Without a notifier; alerts are dropped after being reported.
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    pub fn dispatch(&self, alert: Alert) {
        let Some(tx) = &self.tx else {
            return;
        };

        if let Err(err) = tx.send(alert) {
            tracing::warn!(frame = err.0.frame, "notification worker has stopped");
        }
    }

    /// Waits for every queued alert to be handled.
    pub fn finish(&mut self) -> DispatchStats {
        self.tx.take();

        match self.worker.take().map(JoinHandle::join) {
            Some(Ok(stats)) => stats,
            Some(Err(_)) => {
                tracing::warn!("notification worker panicked");
                DispatchStats::default()
            }
            None => DispatchStats::default(),
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recording {
        seen: Arc<Mutex<Vec<usize>>>,
        fail_on: Vec<usize>,
    }

    impl Notifier for Recording {
        fn notify(&mut self, alert: &Alert) -> Result<()> {
            self.seen.lock().unwrap().push(alert.frame);
            if self.fail_on.contains(&alert.frame) {
                return Err(Error::Notification("gateway unavailable".into()));
            }
            Ok(())
        }
    }

    fn alert(frame: usize) -> Alert {
        Alert {
            frame,
            time: Duration::from_secs(frame as u64),
            ratio: 1.0,
        }
    }

    #[test]
    fn failures_do_not_stop_later_deliveries() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut dispatcher = Dispatcher::spawn(Recording {
            seen: seen.clone(),
            fail_on: vec![2],
        });

        for frame in [1, 2, 3] {
            dispatcher.dispatch(alert(frame));
        }
        let stats = dispatcher.finish();

        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
        assert_eq!(stats.delivered, vec![1, 3]);
        assert_eq!(stats.failed, vec![2]);
    }

    #[test]
    fn disabled_dispatcher_drops_alerts() {
        let mut dispatcher = Dispatcher::disabled();
        dispatcher.dispatch(alert(7));

        assert_eq!(dispatcher.finish(), DispatchStats::default());
    }

    #[test]
    fn sms_requires_recipient() {
        let mut notifier = SmsNotifier::new(None, " ".to_string());
        assert!(notifier.notify(&alert(1)).is_err());

        let mut notifier = SmsNotifier::new(Some("+15550100".into()), "+15550199".into());
        assert!(notifier.notify(&alert(1)).is_ok());
    }
}
