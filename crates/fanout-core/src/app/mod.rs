//! App - アプリケーション層
//!
//! resilience と observability を組み合わせて executor を実装します。
//!
//! # 主要コンポーネント
//! - **ParallelExecutor**: バッチ単位の並行実行（dispatcher）
//! - **execute_in_waves**: wave 単位のオーケストレーション
//! - **ExecutorStatus**: 状態ビュー

pub mod dispatcher;
pub mod status;
pub mod waves;

pub use self::dispatcher::{ParallelExecutor, SharedProgress};
pub use self::status::ExecutorStatus;
pub use self::waves::execute_in_waves;
