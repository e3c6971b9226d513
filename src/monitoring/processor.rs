//! Audit monitor loop
//!
//! Pulls lines from the log follower, parses and classifies them, and forwards the
//! resulting intents to the notifier until the shutdown future completes.

use crate::event::{classify, AuditRecord, NotificationIntent, RuleSet, Severity};
use crate::monitoring::discord_alert::colors;
use crate::monitoring::{DiscordNotifier, LogFollower, NotifyOutcome};
use crate::utils::AppError;
use chrono::Utc;
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

pub const MONITOR_ACTIVE_TITLE: &str = "🛡️ Vault Warden Active";
pub const MONITOR_STOPPED_TITLE: &str = "🛑 Vault Warden Stopped";

/// Monitor lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Running,
    ShuttingDown,
}

/// Counters reported when the monitor stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MonitorReport {
    pub lines_read: u64,
    pub records_parsed: u64,
    pub lines_skipped: u64,
    pub intents_raised: u64,
    pub notifications_failed: u64,
}

/// Audit monitor: follower -> parse -> classify -> notify
pub struct AuditMonitor {
    audit_log: PathBuf,
    poll_interval: Duration,
    rules: RuleSet,
    notifier: DiscordNotifier,
    state: MonitorState,
    report: MonitorReport,
}

impl AuditMonitor {
    pub fn new(
        audit_log: impl Into<PathBuf>,
        rules: RuleSet,
        notifier: DiscordNotifier,
    ) -> Self {
        Self {
            audit_log: audit_log.into(),
            poll_interval: crate::monitoring::log_watcher::DEFAULT_POLL_INTERVAL,
            rules,
            notifier,
            state: MonitorState::Starting,
            report: MonitorReport::default(),
        }
    }

    /// Set the follower poll interval
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn report(&self) -> &MonitorReport {
        &self.report
    }

    /// Run until `shutdown` completes.
    ///
    /// Fails only if the audit log cannot be opened at startup.
    pub async fn run<F>(mut self, shutdown: F) -> Result<MonitorReport, AppError>
    where
        F: Future<Output = ()>,
    {
        info!(audit_log = %self.audit_log.display(), "Audit monitor starting");
        self.transition(MonitorState::Starting);
        self.announce(
            MONITOR_ACTIVE_TITLE,
            format!("Monitoring audit log `{}`", self.audit_log.display()),
        )
        .await;

        let follower = LogFollower::open(&self.audit_log, self.poll_interval)?;
        self.follow(follower, shutdown).await;

        Ok(self.report)
    }

    /// Running and ShuttingDown phases over an already open follower.
    ///
    /// Shutdown is checked before every line, so lines still waiting in the file
    /// are left unread once it has fired.
    async fn follow<F>(&mut self, mut follower: LogFollower, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        self.transition(MonitorState::Running);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                line = follower.next_line() => {
                    self.process_line(&line).await;
                }
            }
        }

        self.transition(MonitorState::ShuttingDown);
        self.announce(
            MONITOR_STOPPED_TITLE,
            format!("Stopped monitoring audit log `{}`", self.audit_log.display()),
        )
        .await;
        follower.close();

        info!(
            lines_read = self.report.lines_read,
            records_parsed = self.report.records_parsed,
            lines_skipped = self.report.lines_skipped,
            intents_raised = self.report.intents_raised,
            notifications_failed = self.report.notifications_failed,
            "Audit monitor stopped"
        );
    }

    /// Handle one raw audit line. Returns the number of intents dispatched.
    pub async fn process_line(&mut self, line: &str) -> usize {
        self.report.lines_read += 1;

        let Some(record) = AuditRecord::parse(line) else {
            self.report.lines_skipped += 1;
            debug!("Skipping unparseable audit line");
            return 0;
        };
        self.report.records_parsed += 1;

        let intents = classify(&record, &self.rules, Utc::now());
        for intent in &intents {
            info!(
                title = %intent.title,
                severity = %intent.severity,
                path = %record.request_path,
                user = %record.auth_display_name,
                "Audit rule triggered"
            );
            self.report.intents_raised += 1;
            if let NotifyOutcome::Failed(_) = self.notifier.notify(intent).await {
                self.report.notifications_failed += 1;
            }
        }

        intents.len()
    }

    async fn announce(&mut self, title: &str, description: String) {
        let intent = NotificationIntent::new(title, description, Severity::Info);
        if let NotifyOutcome::Failed(_) = self
            .notifier
            .notify_with_color(&intent, colors::STATUS)
            .await
        {
            self.report.notifications_failed += 1;
        }
    }

    fn transition(&mut self, next: MonitorState) {
        debug!(from = ?self.state, to = ?next, "Audit monitor state change");
        self.state = next;
    }
}
