//! Seedflow core
//!
//! マルチサービスデプロイプロジェクトのスキャフォールディングの中核。
//! サービスレジストリ、シークレット生成、composeドキュメントの
//! データモデルを提供します。

pub mod error;
pub mod model;
pub mod registry;
pub mod secret;

pub use error::{Result, ScaffoldError};
pub use model::*;
pub use registry::*;
pub use secret::{DEFAULT_SECRET_LEN, SecretProvisioner};
