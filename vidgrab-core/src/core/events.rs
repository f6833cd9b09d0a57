use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchItemInfo {
    pub url: String,
    pub success: bool,
    pub title: Option<String>,
}

/// Emitted once per finished batch item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchProgress {
    pub percentage: u32,
    pub completed: usize,
    pub total: usize,
    pub item: Option<BatchItemInfo>,
}

impl BatchProgress {
    pub fn new(completed: usize, total: usize, item: Option<BatchItemInfo>) -> Self {
        let percentage = if total == 0 {
            100
        } else {
            (completed * 100 / total) as u32
        };
        Self {
            percentage,
            completed,
            total,
            item,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SchedulePhase {
    Scheduled,
    Running,
    Terminal,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduleStatus {
    pub id: String,
    pub url: String,
    /// Local wall-clock time.
    pub next_run: NaiveDateTime,
    pub is_paused: bool,
    pub phase: SchedulePhase,
    pub runs: u32,
}
