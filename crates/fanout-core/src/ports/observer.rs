//! Observer ports - 進捗・メトリクス・wave 完了の通知先
//!
//! いずれもクロージャで渡せるよう、`Fn` に対する blanket impl を持つ。

use crate::domain::ExecutionResult;
use crate::observability::MetricsSnapshot;

/// 1 タスク完了ごとに `(completed, total, result)` で呼ばれる
pub trait ProgressObserver<R>: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize, result: &ExecutionResult<R>);
}

impl<R, F> ProgressObserver<R> for F
where
    F: Fn(usize, usize, &ExecutionResult<R>) + Send + Sync,
{
    fn on_progress(&self, completed: usize, total: usize, result: &ExecutionResult<R>) {
        self(completed, total, result)
    }
}

/// metrics が有効なとき、1 タスク完了ごとにスナップショットのコピーを受け取る
pub trait MetricsObserver: Send + Sync {
    fn on_metrics_update(&self, snapshot: &MetricsSnapshot);
}

impl<F> MetricsObserver for F
where
    F: Fn(&MetricsSnapshot) + Send + Sync,
{
    fn on_metrics_update(&self, snapshot: &MetricsSnapshot) {
        self(snapshot)
    }
}

/// wave が 1 つ終わるたびに `(wave_index, results)` で呼ばれる
pub trait WaveObserver<R>: Send + Sync {
    fn on_wave_complete(&self, wave_index: usize, results: &[ExecutionResult<R>]);
}

impl<R, F> WaveObserver<R> for F
where
    F: Fn(usize, &[ExecutionResult<R>]) + Send + Sync,
{
    fn on_wave_complete(&self, wave_index: usize, results: &[ExecutionResult<R>]) {
        self(wave_index, results)
    }
}
