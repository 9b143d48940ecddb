//! サービス定義

use super::port::PortPublication;
use super::volume::BindMount;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// composeドキュメント内の1サービス分の定義
///
/// ベースドキュメントとオーバーレイドキュメントで同じスキーマを共有する。
/// オーバーレイには差分となる属性だけを載せるため、未設定のフィールドは
/// シリアライズ時に省略される。
///
/// YAML形式：
/// ```yaml
/// billing-service:
///   build:
///     context: server/billing-service
///   restart: unless-stopped
///   depends_on: [rabbitmq, postgres]
///   environment:
///     APP_NAME: ${PROJECT_NAME}
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDefinition {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<RestartPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub environment: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortPublication>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<BindMount>,
    /// ローカル開発時のホストユーザーマッピング（`${LOCAL_UID}:${LOCAL_GID}` 等）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl ServiceDefinition {
    /// 他のServiceDefinitionをマージする（オーバーレイ適用）
    ///
    /// otherで定義されたフィールドが優先される。オーバーレイは加算のみ：
    /// - Option<T>: otherがSomeならそれを使用、Noneなら元の値を維持
    /// - Vec<T>: otherが空でなければそれを使用、空なら元の値を維持
    /// - IndexMap<K, V>: 元の値にotherの値をマージ（otherが優先）
    ///
    /// どの分岐もベース側のキーを削除することはない。
    pub fn merge(&mut self, other: ServiceDefinition) {
        if other.image.is_some() {
            self.image = other.image;
        }
        if let Some(build) = other.build {
            match (&mut self.build, build) {
                (Some(base), overlay) => base.merge(overlay),
                (slot @ None, overlay) => *slot = Some(overlay),
            }
        }
        if other.restart.is_some() {
            self.restart = other.restart;
        }
        if other.user.is_some() {
            self.user = other.user;
        }

        if !other.depends_on.is_empty() {
            self.depends_on = other.depends_on;
        }
        if !other.ports.is_empty() {
            self.ports = other.ports;
        }
        if !other.volumes.is_empty() {
            self.volumes = other.volumes;
        }

        for (key, value) in other.environment {
            self.environment.insert(key, value);
        }
    }
}

/// ビルド設定
///
/// composeの2形式に対応する：
/// - 短縮形（コンテキストパスのみ）: `build: server/proxy`
/// - 詳細形: `build: { context: ..., args: { DEBUG: "true" } }`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildSpec {
    Context(String),
    Detailed {
        #[serde(skip_serializing_if = "Option::is_none")]
        context: Option<String>,
        #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
        args: IndexMap<String, String>,
    },
}

impl BuildSpec {
    /// ビルド引数だけを持つ詳細形を作成（ローカルオーバーレイ用）
    pub fn args_only(args: IndexMap<String, String>) -> Self {
        Self::Detailed {
            context: None,
            args,
        }
    }

    /// ビルドコンテキストのパスを返す
    pub fn context(&self) -> Option<&str> {
        match self {
            Self::Context(path) => Some(path),
            Self::Detailed { context, .. } => context.as_deref(),
        }
    }

    /// オーバーレイ側のビルド設定をマージする
    ///
    /// 短縮形同士・詳細形同士どちらの組み合わせでも、オーバーレイに
    /// 存在する要素だけを上書きする。
    pub fn merge(&mut self, other: BuildSpec) {
        let (base_ctx, mut base_args) = match self.clone() {
            Self::Context(path) => (Some(path), IndexMap::new()),
            Self::Detailed { context, args } => (context, args),
        };
        let (other_ctx, other_args) = match other {
            Self::Context(path) => (Some(path), IndexMap::new()),
            Self::Detailed { context, args } => (context, args),
        };

        let context = other_ctx.or(base_ctx);
        base_args.extend(other_args);

        *self = if base_args.is_empty() {
            match context {
                Some(path) => Self::Context(path),
                None => Self::Detailed {
                    context: None,
                    args: IndexMap::new(),
                },
            }
        } else {
            Self::Detailed {
                context,
                args: base_args,
            }
        };
    }
}

/// 再起動ポリシー (no, always, on-failure, unless-stopped)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RestartPolicy {
    /// 再起動しない（デフォルト）
    #[default]
    No,
    /// 常に再起動
    Always,
    /// 異常終了時のみ再起動
    OnFailure,
    /// 明示的に停止しない限り再起動
    UnlessStopped,
}

impl RestartPolicy {
    /// 文字列からパース
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "no" => Some(Self::No),
            "always" => Some(Self::Always),
            "on-failure" | "on_failure" => Some(Self::OnFailure),
            "unless-stopped" | "unless_stopped" => Some(Self::UnlessStopped),
            _ => None,
        }
    }

    /// composeドキュメントで使用する文字列に変換
    pub fn as_compose_str(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure => "on-failure",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}
