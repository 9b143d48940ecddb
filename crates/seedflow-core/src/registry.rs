//! サービスレジストリ
//!
//! 対話フェーズで宣言されたサービスを保持する唯一の情報源。
//! 宣言フェーズ中のみ可変で、`seal()` 後は読み取り専用のスナップショット
//! （`SealedRegistry`）として各ジェネレータに渡される。

use crate::error::{Result, ScaffoldError};
use crate::secret::SecretProvisioner;
use std::path::PathBuf;
use tracing::debug;

/// 認証サービスの固定サービス名
pub const AUTH_SERVICE_NAME: &str = "auth-service";
/// 認証サービスのシークレット環境変数名（導出せず固定）
pub const AUTH_SECRET_ENV_NAME: &str = "AUTH_SERVICE_KEY";
/// サービス名の固定サフィックス（短縮名はこれを除いたもの）
pub const SERVICE_NAME_SUFFIX: &str = "-service";
/// 認証サービスが消費するサービスキー許可リストの環境変数名
pub const AUTH_ALLOWLIST_ENV_NAME: &str = "AUTH_SERVICE_ENVIRONMENT_APP_SERVICES";

/// メッセージブローカーの固定インフラサービス名
pub const BROKER_SERVICE: &str = "rabbitmq";
/// リレーショナルストアの固定インフラサービス名
pub const STORE_SERVICE: &str = "postgres";

/// ビルドバリアント
///
/// サービスがローカルのソースチェックアウトからビルドされるか、
/// ビルド済みイメージをpullするかを表す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildVariant {
    /// ソースチェックアウトからビルドする
    BuildFromSource {
        /// チェックアウトのプロジェクトルートからの相対パス
        path: PathBuf,
    },
    /// バージョン付きのビルド済みイメージをpullする
    PullPrebuiltImage {
        /// 解決済みイメージ参照（`namespace/name:tag`）
        image: String,
    },
}

impl BuildVariant {
    /// インフラ依存サービスのリスト（バリアントごとに固定、ユーザー指定不可）
    ///
    /// 現状どちらのバリアントもスキーマを持つためブローカー＋ストア。
    /// ステートレスなサービス種別を導入する場合はここでブローカーのみを返す。
    pub fn depends_on(&self) -> Vec<String> {
        match self {
            Self::BuildFromSource { .. } | Self::PullPrebuiltImage { .. } => {
                vec![BROKER_SERVICE.to_string(), STORE_SERVICE.to_string()]
            }
        }
    }
}

/// 宣言された1サービスの記述子
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// レジストリ内で一意なサービス名（`billing-service` 等）
    pub name: String,
    pub variant: BuildVariant,
    /// `name` から決定的に導出されるシークレット環境変数名
    pub secret_env_var: String,
}

impl ServiceDescriptor {
    /// 記述子を作成する。シークレット環境変数名は名前から導出される。
    pub fn new(name: impl Into<String>, variant: BuildVariant) -> Self {
        let name = name.into();
        let secret_env_var = derive_secret_env_name(&name);
        Self {
            name,
            variant,
            secret_env_var,
        }
    }

    /// 必須の認証サービスの記述子を作成する
    ///
    /// 名前と環境変数名は固定で、導出はスキップされる。
    pub fn auth(variant: BuildVariant) -> Self {
        Self {
            name: AUTH_SERVICE_NAME.to_string(),
            variant,
            secret_env_var: AUTH_SECRET_ENV_NAME.to_string(),
        }
    }

    /// 固定サフィックスを除いた短縮表示名（`billing-service` → `billing`）
    pub fn short_name(&self) -> &str {
        self.name
            .strip_suffix(SERVICE_NAME_SUFFIX)
            .unwrap_or(&self.name)
    }

    pub fn is_auth(&self) -> bool {
        self.name == AUTH_SERVICE_NAME
    }

    /// ソースビルドバリアントか
    pub fn is_build_from_source(&self) -> bool {
        matches!(self.variant, BuildVariant::BuildFromSource { .. })
    }
}

/// サービス名からシークレット環境変数名を導出する純関数
///
/// 単語境界（`-`、`_`、空白、小文字→大文字の遷移）をアンダースコア区切りの
/// 大文字形式に変換し、固定サフィックス `_KEY` を付ける。
///
/// 例: `billing-service` → `BILLING_SERVICE_KEY`
pub fn derive_secret_env_name(service_name: &str) -> String {
    let mut out = String::with_capacity(service_name.len() + 4);
    let mut prev_lower = false;
    for c in service_name.chars() {
        if c == '-' || c == '_' || c.is_whitespace() {
            if !out.ends_with('_') && !out.is_empty() {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        if c.is_uppercase() && prev_lower && !out.is_empty() {
            out.push('_');
        }
        prev_lower = c.is_lowercase();
        out.extend(c.to_uppercase());
    }
    out.push_str("_KEY");
    out
}

/// サービス名の構文検証
///
/// 空または空白のみの名前はレジストリに到達する前に弾く。
pub fn validate_service_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ScaffoldError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// 生成されたシークレットとそれを参照する環境変数名のペア
#[derive(Debug, Clone)]
pub struct SecretRecord {
    pub env_var: String,
    pub value: String,
}

/// 可変フェーズのサービスレジストリ
///
/// 挿入順を保持し、その順序がすべての出力ドキュメントの順序を決める。
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
    sealed: Option<SealedRegistry>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// サービスを宣言する
    ///
    /// 封印後は `RegistrySealed`、名前重複（大文字小文字区別）は
    /// `DuplicateName` で失敗する。名前が異なっても導出された
    /// シークレット環境変数名が既存のものと衝突する場合は
    /// `DuplicateSecretEnvName` で失敗する。失敗した呼び出しは
    /// レジストリの状態を一切変更しない。
    pub fn declare(&mut self, descriptor: ServiceDescriptor) -> Result<()> {
        if self.sealed.is_some() {
            return Err(ScaffoldError::RegistrySealed);
        }
        validate_service_name(&descriptor.name)?;
        if self.contains(&descriptor.name) {
            return Err(ScaffoldError::DuplicateName(descriptor.name));
        }
        if self.contains_secret_env(&descriptor.secret_env_var) {
            return Err(ScaffoldError::DuplicateSecretEnvName(
                descriptor.secret_env_var,
            ));
        }
        debug!(service = %descriptor.name, "Service declared");
        self.services.push(descriptor);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.iter().any(|s| s.name == name)
    }

    /// シークレット環境変数名が既に登録済みか
    pub fn contains_secret_env(&self, env_var: &str) -> bool {
        self.services.iter().any(|s| s.secret_env_var == env_var)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// レジストリを封印し、読み取り専用スナップショットを返す
    ///
    /// 最初の呼び出しでサービスごとにシークレットを1つずつ生成する。
    /// 2回目以降は同じスナップショットを返す（冪等、シークレットの
    /// 再生成はしない）。
    pub fn seal(&mut self, provisioner: &mut SecretProvisioner) -> SealedRegistry {
        if let Some(sealed) = &self.sealed {
            return sealed.clone();
        }
        let secrets = self
            .services
            .iter()
            .map(|s| SecretRecord {
                env_var: s.secret_env_var.clone(),
                value: provisioner.mint(),
            })
            .collect();
        let sealed = SealedRegistry {
            services: self.services.clone(),
            secrets,
        };
        debug!(services = sealed.services.len(), "Registry sealed");
        self.sealed = Some(sealed.clone());
        sealed
    }
}

/// 封印済みレジストリ
///
/// 宣言フェーズの成果物。以後は読み取り専用で、各ジェネレータが
/// 任意の順序で安全に参照できる。
#[derive(Debug, Clone)]
pub struct SealedRegistry {
    services: Vec<ServiceDescriptor>,
    secrets: Vec<SecretRecord>,
}

impl SealedRegistry {
    /// 宣言順のサービス記述子
    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    /// 宣言順のシークレットレコード（サービスごとに1つ）
    pub fn secrets(&self) -> &[SecretRecord] {
        &self.secrets
    }

    pub fn secret_for(&self, env_var: &str) -> Option<&SecretRecord> {
        self.secrets.iter().find(|s| s.env_var == env_var)
    }

    /// データベース/スキーマ名のリスト（サービス短縮名、宣言順）
    ///
    /// 認証サービスが先頭で宣言されるため `auth` が固定の先頭エントリになる。
    pub fn database_names(&self) -> Vec<&str> {
        self.services.iter().map(|s| s.short_name()).collect()
    }
}
