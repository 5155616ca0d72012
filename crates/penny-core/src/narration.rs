//! Narration - short spoken/displayed lines emitted at key moments.
//!
//! The engine queues [`Notification`]s and hands them to a [`NarrationSink`]
//! when flushed. Delivery is fire-and-forget: a failing sink is logged and
//! otherwise ignored, and never touches game state.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    MonthEnded { month_index: u32 },
    /// Month closed from the "End Month" action.
    MonthClosedManually { month_index: u32 },
    TasksGenerated { count: usize },
    FallbackTasksLoaded { count: usize },
    TaskPaid { title: String },
    InsufficientFunds { title: String, cost_cents: i64 },
    TransferComplete,
    TransferFailed,
    CoachTip,
}

impl Notification {
    /// The line read out to the player.
    pub fn text(&self) -> String {
        match self {
            Notification::MonthEnded { .. } => "Month ended! Let's look at your results.".into(),
            Notification::MonthClosedManually { .. } => "Month closed. Check your bank statement!".into(),
            Notification::TasksGenerated { .. } => {
                "New month tasks are ready. Walk around to find them!".into()
            }
            Notification::FallbackTasksLoaded { .. } => "Tasks loaded. Walk around to find them!".into(),
            Notification::TaskPaid { title } => format!("Nice! You paid: {}.", title),
            Notification::InsufficientFunds { .. } => {
                "Not enough money in checking. Try transferring from savings.".into()
            }
            Notification::TransferComplete => "Transfer complete. Nice saving move!".into(),
            Notification::TransferFailed => {
                "Oops! You don't have enough money in that account.".into()
            }
            Notification::CoachTip => "Here's a tip from your money coach.".into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("narration channel unavailable: {0}")]
    Unavailable(String),
}

pub trait NarrationSink: Send {
    fn narrate(&mut self, line: &str) -> Result<(), NarrationError>;
}

/// Drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentSink;

impl NarrationSink for SilentSink {
    fn narrate(&mut self, _line: &str) -> Result<(), NarrationError> {
        Ok(())
    }
}

/// Writes narration to the log at info level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NarrationSink for LogSink {
    fn narrate(&mut self, line: &str) -> Result<(), NarrationError> {
        log::info!("[narration] {}", line);
        Ok(())
    }
}

/// Keeps every line, for tests and transcripts.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    pub lines: Vec<String>,
}

impl NarrationSink for RecordingSink {
    fn narrate(&mut self, line: &str) -> Result<(), NarrationError> {
        self.lines.push(line.to_string());
        Ok(())
    }
}

/// Deliver `notifications` to `sink`, logging and skipping failures.
/// Returns how many lines were delivered.
pub fn deliver(sink: &mut dyn NarrationSink, notifications: &[Notification]) -> usize {
    let mut delivered = 0;
    for note in notifications {
        match sink.narrate(&note.text()) {
            Ok(()) => delivered += 1,
            Err(e) => log::warn!("Narration failed: {}", e),
        }
    }
    delivered
}
