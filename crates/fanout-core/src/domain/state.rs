//! State - タスクの状態
//!
//! 呼び出し側が管理する advisory な状態。executor はこの値を読まないし、書き換えない。

use serde::{Deserialize, Serialize};

/// TaskStatus はタスクのライフサイクル上の位置を表現
///
/// # 状態遷移（呼び出し側の慣例）
/// - pending: 未実行（wave 待ちを含む）
/// - running: 実行中
/// - completed: 成功
/// - failed: リトライを使い切って失敗
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_as_snake_case() {
        let s = serde_json::to_string(&TaskStatus::Completed).unwrap();
        assert_eq!(s, "\"completed\"");

        let back: TaskStatus = serde_json::from_str("\"pending\"").unwrap();
        assert_eq!(back, TaskStatus::Pending);
    }

    #[test]
    fn only_completed_and_failed_are_terminal() {
        assert!(TaskStatus::Completed.is_terminal());
        assert!(TaskStatus::Failed.is_terminal());
        assert!(!TaskStatus::Pending.is_terminal());
        assert!(!TaskStatus::Running.is_terminal());
    }
}
