//! ポート公開定義

use serde::{Deserialize, Serialize};

/// ポート公開定義（compose long syntax）
///
/// YAML形式：
/// ```yaml
/// ports:
///   - published: 5432
///     target: 5432
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortPublication {
    /// ホスト側に公開するポート
    pub published: u16,
    /// コンテナ側のポート
    pub target: u16,
}

impl PortPublication {
    pub fn new(published: u16, target: u16) -> Self {
        Self { published, target }
    }
}
