//! モデル定義
//!
//! Seedflowが生成するcomposeドキュメントのデータモデルを定義します。
//! 各モデルは機能ごとにモジュールに分離されています。

mod document;
mod port;
mod service;
mod volume;

// Re-exports
pub use document::*;
pub use port::*;
pub use service::*;
pub use volume::*;
