//! 環境変数ドキュメント生成
//!
//! 実体の `.env` と値を伏せた `.env.example` の2つを、レジストリの
//! 同一走査から同時に組み立てる。キー集合と順序の一致は事後比較では
//! なく構造的に保証される。

use seedflow_core::{AUTH_ALLOWLIST_ENV_NAME, SealedRegistry};
use std::fmt::Write as _;

use crate::{COMPOSE_FILE, COMPOSE_LOCAL_FILE};

/// 環境変数ドキュメントの1行
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvLine {
    /// `KEY=VALUE` 行
    Pair { key: String, value: String },
    /// `#` で始まるドキュメント用コメント行
    Comment(String),
    /// 空行
    Blank,
}

/// 順序付きの `KEY=VALUE` ドキュメント
#[derive(Debug, Clone, Default)]
pub struct EnvDocument {
    lines: Vec<EnvLine>,
}

impl EnvDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_pair(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.lines.push(EnvLine::Pair {
            key: key.into(),
            value: value.into(),
        });
    }

    pub fn push_comment(&mut self, text: impl Into<String>) {
        self.lines.push(EnvLine::Comment(text.into()));
    }

    pub fn push_blank(&mut self) {
        self.lines.push(EnvLine::Blank);
    }

    pub fn lines(&self) -> &[EnvLine] {
        &self.lines
    }

    /// `Pair` 行のキーを出現順に返す
    pub fn keys(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                EnvLine::Pair { key, .. } => Some(key.as_str()),
                _ => None,
            })
            .collect()
    }

    /// キーに対応する値を返す（最初の出現）
    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            EnvLine::Pair { key: k, value } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// テキストに描画する（改行区切り、クォートなし）
    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            match line {
                EnvLine::Pair { key, value } => {
                    let _ = writeln!(out, "{key}={value}");
                }
                EnvLine::Comment(text) => {
                    let _ = writeln!(out, "# {text}");
                }
                EnvLine::Blank => out.push('\n'),
            }
        }
        out
    }
}

/// 環境変数ドキュメントコンポーザー
pub struct EnvFileComposer<'a> {
    registry: &'a SealedRegistry,
    project_name: &'a str,
}

impl<'a> EnvFileComposer<'a> {
    pub fn new(registry: &'a SealedRegistry, project_name: &'a str) -> Self {
        Self {
            registry,
            project_name,
        }
    }

    /// `(実体, サンプル)` の2ドキュメントを生成する
    ///
    /// 両ドキュメントは同じ呼び出し列から組み立てられるため、キー集合と
    /// 順序は常に一致する。値が異なるのはシークレットとパスワードだけ。
    pub fn compose(&self) -> (EnvDocument, EnvDocument) {
        let mut real = EnvDocument::new();
        let mut example = EnvDocument::new();

        // 両ドキュメントに同一キーを一度にpushするヘルパ
        let push_both = |real: &mut EnvDocument,
                             example: &mut EnvDocument,
                             key: &str,
                             live: &str,
                             sample: &str| {
            real.push_pair(key, live);
            example.push_pair(key, sample);
        };

        // 前文: プロジェクト名・ドキュメント合成ディレクティブ・共有インフラ資格情報
        push_both(
            &mut real,
            &mut example,
            "PROJECT_NAME",
            self.project_name,
            self.project_name,
        );
        let compose_directive = format!("{COMPOSE_FILE}:{COMPOSE_LOCAL_FILE}");
        push_both(
            &mut real,
            &mut example,
            "COMPOSE_FILE",
            &compose_directive,
            &compose_directive,
        );
        push_both(&mut real, &mut example, "RABBITMQ_USER", "user", "user");
        push_both(&mut real, &mut example, "DB_USERNAME", "user", "user");

        // サービスごとのシークレット（宣言順、実体は生成値・サンプルは空）
        for secret in self.registry.secrets() {
            push_both(
                &mut real,
                &mut example,
                &secret.env_var,
                &secret.value,
                "",
            );
        }

        // 後文: 共有インフラのパスワードと許可リスト
        push_both(&mut real, &mut example, "DB_PASSWORD", "password", "");
        push_both(
            &mut real,
            &mut example,
            "RABBITMQ_PASSWORD",
            "password",
            "",
        );
        let allow_list = self.allow_list();
        push_both(
            &mut real,
            &mut example,
            AUTH_ALLOWLIST_ENV_NAME,
            &allow_list,
            "",
        );

        // ドキュメント用: 無効化されたホストユーザー上書き
        for doc in [&mut real, &mut example] {
            doc.push_blank();
            doc.push_comment("コンテナ内で作成されるファイルをホストユーザー所有にする場合は有効化");
            doc.push_comment("LOCAL_UID=1000");
            doc.push_comment("LOCAL_GID=1000");
        }

        (real, example)
    }

    /// 認証サービスが消費するサービスキー許可リスト
    ///
    /// `短縮名:シークレット値` をカンマ結合する。認証サービス自身の
    /// キーは別の固定変数で参照されるため含めない。
    fn allow_list(&self) -> String {
        self.registry
            .services()
            .iter()
            .zip(self.registry.secrets())
            .filter(|(service, _)| !service.is_auth())
            .map(|(service, secret)| format!("{}:{}", service.short_name(), secret.value))
            .collect::<Vec<_>>()
            .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedflow_core::{
        BuildVariant, SecretProvisioner, ServiceDescriptor, ServiceRegistry,
    };
    use std::path::PathBuf;

    fn sealed_registry() -> SealedRegistry {
        let mut registry = ServiceRegistry::new();
        registry
            .declare(ServiceDescriptor::auth(BuildVariant::BuildFromSource {
                path: PathBuf::from("server/auth-service"),
            }))
            .unwrap();
        registry
            .declare(ServiceDescriptor::new(
                "billing-service",
                BuildVariant::BuildFromSource {
                    path: PathBuf::from("server/billing-service"),
                },
            ))
            .unwrap();
        registry
            .declare(ServiceDescriptor::new(
                "reports-service",
                BuildVariant::PullPrebuiltImage {
                    image: "seedbox/reports-service:2.4.0".to_string(),
                },
            ))
            .unwrap();
        registry.seal(&mut SecretProvisioner::from_seed(21))
    }

    #[test]
    fn test_key_sequences_are_identical() {
        let sealed = sealed_registry();
        let (real, example) = EnvFileComposer::new(&sealed, "shop").compose();
        assert_eq!(real.keys(), example.keys());
    }

    #[test]
    fn test_secret_lines_in_declaration_order() {
        let sealed = sealed_registry();
        let (real, example) = EnvFileComposer::new(&sealed, "shop").compose();

        let keys = real.keys();
        let auth_pos = keys.iter().position(|k| *k == "AUTH_SERVICE_KEY").unwrap();
        let billing_pos = keys
            .iter()
            .position(|k| *k == "BILLING_SERVICE_KEY")
            .unwrap();
        let reports_pos = keys
            .iter()
            .position(|k| *k == "REPORTS_SERVICE_KEY")
            .unwrap();
        assert!(auth_pos < billing_pos && billing_pos < reports_pos);

        // 実体は非空の生成値、サンプルは空
        for key in ["AUTH_SERVICE_KEY", "BILLING_SERVICE_KEY", "REPORTS_SERVICE_KEY"] {
            assert!(!real.get(key).unwrap().is_empty());
            assert_eq!(example.get(key), Some(""));
        }
    }

    #[test]
    fn test_only_secret_and_password_values_differ() {
        let sealed = sealed_registry();
        let (real, example) = EnvFileComposer::new(&sealed, "shop").compose();

        let differing: Vec<&str> = real
            .keys()
            .into_iter()
            .filter(|key| real.get(key) != example.get(key))
            .collect();
        assert_eq!(
            differing,
            vec![
                "AUTH_SERVICE_KEY",
                "BILLING_SERVICE_KEY",
                "REPORTS_SERVICE_KEY",
                "DB_PASSWORD",
                "RABBITMQ_PASSWORD",
                AUTH_ALLOWLIST_ENV_NAME,
            ]
        );
    }

    #[test]
    fn test_allow_list_excludes_auth() {
        let sealed = sealed_registry();
        let (real, _) = EnvFileComposer::new(&sealed, "shop").compose();

        let allow_list = real.get(AUTH_ALLOWLIST_ENV_NAME).unwrap();
        let entries: Vec<&str> = allow_list.split(',').collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].starts_with("billing:"));
        assert!(entries[1].starts_with("reports:"));

        // 各エントリのシークレット値はレジストリのものと一致する
        let billing_secret = sealed.secret_for("BILLING_SERVICE_KEY").unwrap();
        assert_eq!(
            entries[0],
            format!("billing:{}", billing_secret.value)
        );
    }

    #[test]
    fn test_render_format() {
        let sealed = sealed_registry();
        let (real, _) = EnvFileComposer::new(&sealed, "shop").compose();
        let text = real.render();

        assert!(text.starts_with("PROJECT_NAME=shop\n"));
        assert!(text.contains("COMPOSE_FILE=docker-compose.yml:docker-compose.local.yml\n"));
        // コメント行は `#` プレフィックス
        assert!(text.contains("# LOCAL_UID=1000"));
    }
}
