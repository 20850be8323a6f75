//! Ports - 抽象化レイヤー
//!
//! executor と呼び出し側の境界。
//!
//! # 主要な trait
//! - **TaskExecutor**: 1 タスクの試行（呼び出し側が実装）
//! - **ProgressObserver**: タスク完了通知
//! - **MetricsObserver**: メトリクス更新通知
//! - **WaveObserver**: wave 完了通知

pub mod executor;
pub mod observer;

pub use self::executor::TaskExecutor;
pub use self::observer::{MetricsObserver, ProgressObserver, WaveObserver};
