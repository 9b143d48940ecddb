//! composeドキュメント定義

use super::service::ServiceDefinition;
use crate::error::Result;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// composeフォーマットバージョン
pub const COMPOSE_FORMAT_VERSION: &str = "3.7";

/// composeドキュメント
///
/// ベース・ローカル・デプロイ各ドキュメントが同じスキーマを共有する。
/// `services` は挿入順を保持し、そのままYAML出力の順序になる。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComposeDocument {
    pub version: String,
    pub services: IndexMap<String, ServiceDefinition>,
}

impl ComposeDocument {
    /// 空のcomposeドキュメントを作成
    pub fn new() -> Self {
        Self {
            version: COMPOSE_FORMAT_VERSION.to_string(),
            services: IndexMap::new(),
        }
    }

    /// サービス定義を追加する（挿入順保持）
    pub fn insert(&mut self, name: impl Into<String>, definition: ServiceDefinition) {
        self.services.insert(name.into(), definition);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// YAML文字列にシリアライズ
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// YAML文字列からパース
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// オーバーレイドキュメントを適用した結果を返す
    ///
    /// オーバーレイに新しいサービスがあれば追加、既存のサービスは
    /// `ServiceDefinition::merge` で属性マージされる。ベース側の
    /// キーが削除されることはない。
    pub fn merged_with(&self, overlay: &ComposeDocument) -> ComposeDocument {
        let mut result = self.clone();
        for (name, definition) in &overlay.services {
            match result.services.get_mut(name) {
                Some(base) => base.merge(definition.clone()),
                None => {
                    result.services.insert(name.clone(), definition.clone());
                }
            }
        }
        result
    }
}

impl Default for ComposeDocument {
    fn default() -> Self {
        Self::new()
    }
}
