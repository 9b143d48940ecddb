//! composeドキュメント生成
//!
//! 封印済みレジストリからベースドキュメントと各環境向け
//! オーバーレイドキュメントを組み立てる。

use indexmap::IndexMap;
use seedflow_core::{
    AUTH_ALLOWLIST_ENV_NAME, BROKER_SERVICE, BindMount, BuildSpec, BuildVariant, ComposeDocument,
    PortPublication, RestartPolicy, Result, STORE_SERVICE, ScaffoldError, SealedRegistry,
    ServiceDefinition, ServiceDescriptor,
};
use tracing::debug;

/// リレーショナルストアの固定イメージ
pub const STORE_IMAGE: &str = "seedbox/postgres:16.3";
/// メッセージブローカーの固定イメージ
pub const BROKER_IMAGE: &str = "seedbox/rabbitmq:3.13.2";

/// 生成されるcomposeドキュメント一式
#[derive(Debug, Clone)]
pub struct ComposeBundle {
    /// ベースドキュメント（インフラ＋全宣言サービス）
    pub base: ComposeDocument,
    /// ローカル開発オーバーレイ（ポート公開・バインドマウント・デバッグビルド）
    pub local: ComposeDocument,
    /// デプロイ統括ドキュメント（プロキシ・クライアントの固定エントリのみ）
    pub deploy: ComposeDocument,
    /// ステージ別プレースホルダ（意図的に空。後からの手動カスタマイズ用）
    pub deploy_develop: ComposeDocument,
    pub deploy_stage: ComposeDocument,
    pub deploy_production: ComposeDocument,
}

/// composeドキュメントビルダー
pub struct ComposeDocumentBuilder<'a> {
    registry: &'a SealedRegistry,
}

impl<'a> ComposeDocumentBuilder<'a> {
    pub fn new(registry: &'a SealedRegistry) -> Self {
        Self { registry }
    }

    /// ドキュメント一式を生成する
    ///
    /// サービス由来のオーバーレイはベースに存在するサービスしか参照しない
    /// ことを検証してから返す（違反は生成ロジックのバグ）。
    pub fn build(&self) -> Result<ComposeBundle> {
        let base = self.base_document();
        let local = self.local_overlay();
        verify_overlay(&base, &local)?;

        let bundle = ComposeBundle {
            base,
            local,
            deploy: self.deploy_document(),
            deploy_develop: ComposeDocument::new(),
            deploy_stage: ComposeDocument::new(),
            deploy_production: ComposeDocument::new(),
        };
        debug!(
            services = bundle.base.services.len(),
            "Compose documents built"
        );
        Ok(bundle)
    }

    /// ベースドキュメント
    ///
    /// 固定のインフラスケルトン（ストア・ブローカー）に、宣言順で
    /// サービスエントリを合成して追加する。シークレット値そのものは
    /// 決して埋め込まず、環境変数プレースホルダで参照する。
    fn base_document(&self) -> ComposeDocument {
        let mut doc = ComposeDocument::new();

        doc.insert(
            STORE_SERVICE,
            ServiceDefinition {
                image: Some(STORE_IMAGE.to_string()),
                restart: Some(RestartPolicy::UnlessStopped),
                environment: IndexMap::from([
                    ("POSTGRES_USER".to_string(), "${DB_USERNAME}".to_string()),
                    (
                        "POSTGRES_PASSWORD".to_string(),
                        "${DB_PASSWORD}".to_string(),
                    ),
                    (
                        "POSTGRES_MULTIPLE_DATABASES".to_string(),
                        self.registry.database_names().join(","),
                    ),
                ]),
                ..Default::default()
            },
        );

        doc.insert(
            BROKER_SERVICE,
            ServiceDefinition {
                image: Some(BROKER_IMAGE.to_string()),
                restart: Some(RestartPolicy::UnlessStopped),
                environment: IndexMap::from([
                    ("RABBITMQ_USER".to_string(), "${RABBITMQ_USER}".to_string()),
                    (
                        "RABBITMQ_PASSWORD".to_string(),
                        "${RABBITMQ_PASSWORD}".to_string(),
                    ),
                ]),
                ..Default::default()
            },
        );

        for descriptor in self.registry.services() {
            doc.insert(descriptor.name.clone(), self.base_service(descriptor));
        }

        doc
    }

    /// 宣言サービス1つ分のベース定義を合成する
    fn base_service(&self, descriptor: &ServiceDescriptor) -> ServiceDefinition {
        let (image, build) = match &descriptor.variant {
            BuildVariant::BuildFromSource { path } => (
                None,
                Some(BuildSpec::Context(path.display().to_string())),
            ),
            BuildVariant::PullPrebuiltImage { image } => (Some(image.clone()), None),
        };

        ServiceDefinition {
            image,
            build,
            restart: Some(RestartPolicy::UnlessStopped),
            depends_on: descriptor.variant.depends_on(),
            environment: self.service_environment(descriptor),
            ..Default::default()
        }
    }

    /// 固定テンプレートにサービスごとの2つの置換
    /// （短縮名・シークレット環境変数参照）を適用した環境マッピング
    fn service_environment(&self, descriptor: &ServiceDescriptor) -> IndexMap<String, String> {
        let mut env = IndexMap::new();
        env.insert("APP_NAME".to_string(), "${PROJECT_NAME}".to_string());
        env.insert(
            "APP_SERVICE_NAME".to_string(),
            descriptor.short_name().to_string(),
        );
        env.insert(
            "APP_SERVICE_KEY".to_string(),
            format!("${{{}}}", descriptor.secret_env_var),
        );
        if descriptor.is_auth() {
            // 認証サービスだけがサービスキー許可リストを消費する
            env.insert(
                "APP_SERVICES".to_string(),
                format!("${{{AUTH_ALLOWLIST_ENV_NAME}}}"),
            );
        }
        env.insert("DB_HOST".to_string(), STORE_SERVICE.to_string());
        env.insert("DB_USERNAME".to_string(), "${DB_USERNAME}".to_string());
        env.insert("DB_PASSWORD".to_string(), "${DB_PASSWORD}".to_string());
        env.insert("RABBITMQ_HOST".to_string(), BROKER_SERVICE.to_string());
        env.insert("RABBITMQ_USER".to_string(), "${RABBITMQ_USER}".to_string());
        env.insert(
            "RABBITMQ_PASSWORD".to_string(),
            "${RABBITMQ_PASSWORD}".to_string(),
        );
        env.insert(
            "WAIT_HOSTS".to_string(),
            format!("{BROKER_SERVICE}:5672,{STORE_SERVICE}:5432"),
        );
        env
    }

    /// ローカル開発オーバーレイ
    ///
    /// ローカルで差分となる属性だけを載せる：インフラのポート公開と、
    /// ソースビルドサービスのバインドマウント・デバッグビルド引数・
    /// ホストユーザーマッピング。
    fn local_overlay(&self) -> ComposeDocument {
        let mut doc = ComposeDocument::new();

        doc.insert(
            STORE_SERVICE,
            ServiceDefinition {
                ports: vec![PortPublication::new(5432, 5432)],
                ..Default::default()
            },
        );
        doc.insert(
            BROKER_SERVICE,
            ServiceDefinition {
                ports: vec![
                    PortPublication::new(15672, 15672),
                    PortPublication::new(5672, 5672),
                ],
                ..Default::default()
            },
        );

        for descriptor in self.registry.services() {
            let BuildVariant::BuildFromSource { path } = &descriptor.variant else {
                continue;
            };
            doc.insert(
                descriptor.name.clone(),
                ServiceDefinition {
                    build: Some(BuildSpec::args_only(IndexMap::from([(
                        "DEBUG".to_string(),
                        "true".to_string(),
                    )]))),
                    volumes: vec![BindMount::read_write(
                        format!("./{}", path.display()),
                        "/app",
                    )],
                    // コンテナが作るファイルを実行ユーザー所有にする
                    user: Some("${LOCAL_UID}:${LOCAL_GID}".to_string()),
                    ..Default::default()
                },
            );
        }

        doc
    }

    /// デプロイ統括ドキュメント
    ///
    /// サービス由来ではない固定エントリ（エッジプロキシとクライアント
    /// バンドル）だけを持つ。ステージ別ドキュメントは空のまま出力される。
    fn deploy_document(&self) -> ComposeDocument {
        let mut doc = ComposeDocument::new();
        doc.insert(
            "proxy",
            ServiceDefinition {
                build: Some(BuildSpec::Context("server/proxy".to_string())),
                restart: Some(RestartPolicy::UnlessStopped),
                depends_on: vec!["client".to_string()],
                environment: IndexMap::from([(
                    "WAIT_HOSTS".to_string(),
                    "client:80".to_string(),
                )]),
                ports: vec![
                    PortPublication::new(80, 80),
                    PortPublication::new(443, 443),
                ],
                ..Default::default()
            },
        );
        doc.insert(
            "client",
            ServiceDefinition {
                build: Some(BuildSpec::Context("client".to_string())),
                restart: Some(RestartPolicy::UnlessStopped),
                ..Default::default()
            },
        );
        doc
    }
}

/// オーバーレイがベースに存在するサービスだけを参照することを検証する
///
/// 生成ロジックが保証すべき内部不変条件。違反はユーザーエラーではなく
/// ジェネレータのバグを意味する。
pub fn verify_overlay(base: &ComposeDocument, overlay: &ComposeDocument) -> Result<()> {
    for name in overlay.services.keys() {
        if !base.contains(name) {
            return Err(ScaffoldError::UnknownServiceReference(name.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use seedflow_core::{SecretProvisioner, ServiceRegistry};
    use std::path::PathBuf;

    fn scenario_a_registry() -> SealedRegistry {
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
        registry.seal(&mut SecretProvisioner::from_seed(11))
    }

    #[test]
    fn test_base_document_has_infra_plus_declared_services() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        // ストア・ブローカー・auth・billing・reports で5エントリ
        assert_eq!(bundle.base.services.len(), 5);
        let names: Vec<_> = bundle.base.services.keys().cloned().collect();
        assert_eq!(
            names,
            vec![
                "postgres",
                "rabbitmq",
                "auth-service",
                "billing-service",
                "reports-service"
            ]
        );
    }

    #[test]
    fn test_pull_variant_has_image_and_no_build() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        let reports = &bundle.base.services["reports-service"];
        assert_eq!(
            reports.image.as_deref(),
            Some("seedbox/reports-service:2.4.0")
        );
        assert!(reports.build.is_none());

        let billing = &bundle.base.services["billing-service"];
        assert!(billing.image.is_none());
        assert_eq!(
            billing.build.as_ref().and_then(|b| b.context()),
            Some("server/billing-service")
        );
    }

    #[test]
    fn test_base_references_secrets_as_placeholders() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        let billing = &bundle.base.services["billing-service"];
        assert_eq!(
            billing.environment.get("APP_SERVICE_KEY"),
            Some(&"${BILLING_SERVICE_KEY}".to_string())
        );
        assert_eq!(
            billing.environment.get("APP_SERVICE_NAME"),
            Some(&"billing".to_string())
        );

        // ベースドキュメントにシークレット値そのものは現れない
        let yaml = bundle.base.to_yaml().unwrap();
        for secret in sealed.secrets() {
            assert!(!yaml.contains(&secret.value));
        }

        // 許可リストを消費するのは認証サービスだけ
        assert!(
            bundle.base.services["auth-service"]
                .environment
                .contains_key("APP_SERVICES")
        );
        assert!(!billing.environment.contains_key("APP_SERVICES"));
    }

    #[test]
    fn test_local_overlay_mounts_only_source_services() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        // バインドマウントは auth と billing のみ（reports はpull）
        assert!(bundle.local.contains("auth-service"));
        assert!(bundle.local.contains("billing-service"));
        assert!(!bundle.local.contains("reports-service"));

        let auth = &bundle.local.services["auth-service"];
        assert_eq!(auth.volumes[0].to_string(), "./server/auth-service:/app:rw");
        assert_eq!(auth.user.as_deref(), Some("${LOCAL_UID}:${LOCAL_GID}"));

        // インフラのポート公開
        assert_eq!(bundle.local.services["postgres"].ports.len(), 1);
        assert_eq!(bundle.local.services["rabbitmq"].ports.len(), 2);
    }

    #[test]
    fn test_overlay_is_purely_additive() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        let merged = bundle.base.merged_with(&bundle.local);
        // マージしてもベースのキー集合は失われない
        for (name, base_def) in &bundle.base.services {
            let merged_def = &merged.services[name];
            assert_eq!(merged_def.restart, base_def.restart);
            assert_eq!(merged_def.depends_on, base_def.depends_on);
            for key in base_def.environment.keys() {
                assert!(merged_def.environment.contains_key(key));
            }
        }
    }

    #[test]
    fn test_deploy_document_fixed_entries_and_empty_stages() {
        let sealed = scenario_a_registry();
        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();

        let names: Vec<_> = bundle.deploy.services.keys().cloned().collect();
        assert_eq!(names, vec!["proxy", "client"]);

        // ステージ別ドキュメントは意図的に空
        assert!(bundle.deploy_develop.services.is_empty());
        assert!(bundle.deploy_stage.services.is_empty());
        assert!(bundle.deploy_production.services.is_empty());
    }

    #[test]
    fn test_verify_overlay_detects_unknown_reference() {
        let base = ComposeDocument::new();
        let mut overlay = ComposeDocument::new();
        overlay.insert("ghost-service", ServiceDefinition::default());

        let err = verify_overlay(&base, &overlay).unwrap_err();
        assert!(matches!(err, ScaffoldError::UnknownServiceReference(_)));
    }

    /// シナリオB: 追加サービスなし（auth pullのみ）
    #[test]
    fn test_auth_only_registry_yields_three_services() {
        let mut registry = ServiceRegistry::new();
        registry
            .declare(ServiceDescriptor::auth(BuildVariant::PullPrebuiltImage {
                image: "seedbox/auth-service:3.0.1".to_string(),
            }))
            .unwrap();
        let sealed = registry.seal(&mut SecretProvisioner::from_seed(5));

        let bundle = ComposeDocumentBuilder::new(&sealed).build().unwrap();
        assert_eq!(bundle.base.services.len(), 3);
        // pullバリアントなのでローカルのバインドマウントは無い
        assert!(!bundle.local.contains("auth-service"));
    }
}
