//! Task trait - executor に渡す作業単位の定義
//!
//! # 学習ポイント
//! - Trait の default method で optional な属性を表現
//! - Trait bounds (Send + Sync + 'static) で spawn 可能な型に限定

use serde::{Deserialize, Serialize};

use super::state::TaskStatus;

/// Task は executor がスケジュールする不透明な作業単位
///
/// executor が知っているのは `id` だけで、タスクが何を計算するかは知らない。
///
/// # 使用例
/// ```ignore
/// struct GenerateWorkout {
///     id: String,
///     athlete: String,
/// }
///
/// impl Task for GenerateWorkout {
///     fn id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
///
/// # Trait Bounds
/// - `Send + Sync`: worker task から参照されるため
/// - `'static`: `tokio::spawn` に move するため
pub trait Task: Send + Sync + 'static {
    /// 安定した識別子。結果の `task_id` にそのままコピーされる。
    fn id(&self) -> &str;

    /// Advisory only: the dispatcher does not reorder by priority.
    fn priority(&self) -> Option<i32> {
        None
    }

    /// Ids this task depends on. Ordering is the caller's job (split tasks into waves).
    fn dependencies(&self) -> &[String] {
        &[]
    }

    fn status(&self) -> Option<TaskStatus> {
        None
    }
}

/// TaskSpec は serde 可能な汎用 Task
///
/// CLI のプランファイルやテストで使う。`payload` の解釈は TaskExecutor 次第。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,

    #[serde(default)]
    pub payload: serde_json::Value,
}

impl TaskSpec {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            priority: None,
            dependencies: Vec::new(),
            status: None,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }
}

impl Task for TaskSpec {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> Option<i32> {
        self.priority
    }

    fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    fn status(&self) -> Option<TaskStatus> {
        self.status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_spec_exposes_fields_through_trait() {
        let spec = TaskSpec::new("plan-week-1")
            .with_priority(3)
            .depends_on("profile");

        let task: &dyn Task = &spec;
        assert_eq!(task.id(), "plan-week-1");
        assert_eq!(task.priority(), Some(3));
        assert_eq!(task.dependencies(), &["profile".to_string()]);
        assert_eq!(task.status(), None);
    }

    #[test]
    fn task_spec_deserializes_with_only_an_id() {
        let spec: TaskSpec = serde_json::from_str(r#"{"id":"a"}"#).unwrap();
        assert_eq!(spec.id, "a");
        assert!(spec.dependencies.is_empty());
        assert!(spec.payload.is_null());
    }
}
