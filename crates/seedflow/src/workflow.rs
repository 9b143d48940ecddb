//! スキャフォールドワークフロー
//!
//! 宣言フェーズ（対話層から渡されるイベントの消費）と生成フェーズを
//! 依存順に駆動するオーケストレータ。端末には直接触れず、外部操作は
//! すべてコラボレータトレイト経由で行うため、ライブプロンプトなしで
//! テストできる。
//!
//! 生成フェーズは全ドキュメントをメモリ上で組み立ててから一括で
//! 書き出す。どれか1つでも失敗したら何も書かない（部分出力を
//! 残さない）。

use crate::git::SourceFetcher;
use crate::release::ReleaseIndex;
use anyhow::Context;
use seedflow_ci::{DEPLOY_PIPELINE_FILE, PipelineAssembler, TEST_PIPELINE_FILE};
use seedflow_compose::{
    COMPOSE_DEPLOY_DEVELOP_FILE, COMPOSE_DEPLOY_FILE, COMPOSE_DEPLOY_PRODUCTION_FILE,
    COMPOSE_DEPLOY_STAGE_FILE, COMPOSE_FILE, COMPOSE_LOCAL_FILE, ComposeDocumentBuilder,
    DOT_ENV_EXAMPLE_FILE, DOT_ENV_FILE, EnvFileComposer,
};
use seedflow_core::{
    AUTH_SERVICE_NAME, BuildVariant, Result as CoreResult, SERVICE_NAME_SUFFIX, ScaffoldError,
    SecretProvisioner, ServiceDescriptor, ServiceRegistry, derive_secret_env_name,
    validate_service_name,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// クライアントテンプレートのリポジトリURL
const CLIENT_VUE_GIT_URL: &str = "git@github.com:chronista-club/seed-vue-client.git";
const CLIENT_NUXT_GIT_URL: &str = "git@github.com:chronista-club/seed-nuxt-client.git";
/// サービステンプレートのリポジトリURL
const SERVICE_TEMPLATE_GIT_URL: &str = "git@github.com:chronista-club/seed-service-template.git";
/// 認証サービスのソーステンプレートのリポジトリURL
const AUTH_TEMPLATE_GIT_URL: &str = "git@github.com:chronista-club/seed-auth-service.git";

/// クライアントのチェックアウト先
const CLIENT_PATH: &str = "client";

const GITIGNORE: &str = ".env\n.idea\n";

const PROXY_DOCKERFILE: &str = r#"FROM nginx:1.27-alpine
ADD https://github.com/ufoscout/docker-compose-wait/releases/download/2.12.1/wait /wait
RUN chmod +x /wait
COPY default.conf /etc/nginx/conf.d/default.conf
CMD /bin/sh -c "/wait && nginx -g 'daemon off;'"
"#;

const PROXY_NGINX_CONF: &str = r#"server {
    listen *:80;

    location / {
        proxy_pass http://client:8080;
    }
}
"#;

/// クライアントフレームワークの選択肢
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientKind {
    Vue,
    Nuxt,
}

impl ClientKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Vue => "Vue.js",
            Self::Nuxt => "Nuxt.js",
        }
    }

    fn git_url(&self) -> &'static str {
        match self {
            Self::Vue => CLIENT_VUE_GIT_URL,
            Self::Nuxt => CLIENT_NUXT_GIT_URL,
        }
    }
}

/// ビルドバリアントの選択肢（対話層向け、データなし）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantChoice {
    BuildFromSource,
    PullPrebuiltImage,
}

/// ワークフローの設定
pub struct ScaffoldOptions {
    pub project_name: String,
    /// pullバリアントのイメージ参照の名前空間（`namespace/name:tag`）
    pub image_namespace: String,
}

/// 生成された出力ドキュメント一式（メモリ上）
#[derive(Debug)]
pub struct ScaffoldOutput {
    files: Vec<(PathBuf, String)>,
}

impl ScaffoldOutput {
    /// 相対パスで内容を引く（テスト・検査用）
    pub fn get(&self, rel: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|(path, _)| path == Path::new(rel))
            .map(|(_, content)| content.as_str())
    }

    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(|(path, _)| path.as_path())
    }

    /// 全ドキュメントをプロジェクトルート配下に書き出す
    ///
    /// 呼ばれる時点で全ジェネレータが成功済みなので、ここでの失敗は
    /// I/O異常のみ。ファイルごとに一度だけ書く（reopen-appendはしない）。
    pub fn write_all(&self, root: &Path) -> anyhow::Result<()> {
        for (rel, content) in &self.files {
            let path = root.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("{} を作成できませんでした", parent.display()))?;
            }
            std::fs::write(&path, content)
                .with_context(|| format!("{} を書き込めませんでした", path.display()))?;
        }
        info!(files = self.files.len(), "Scaffold output written");
        Ok(())
    }
}

/// スキャフォールドワークフロー
pub struct ScaffoldWorkflow<'a> {
    options: ScaffoldOptions,
    fetcher: &'a dyn SourceFetcher,
    releases: &'a dyn ReleaseIndex,
    registry: ServiceRegistry,
}

impl<'a> ScaffoldWorkflow<'a> {
    pub fn new(
        options: ScaffoldOptions,
        fetcher: &'a dyn SourceFetcher,
        releases: &'a dyn ReleaseIndex,
    ) -> Self {
        Self {
            options,
            fetcher,
            releases,
            registry: ServiceRegistry::new(),
        }
    }

    /// クライアントテンプレートを取得する
    pub fn add_client(&self, root: &Path, kind: ClientKind) -> anyhow::Result<()> {
        self.fetcher
            .clone_repo(kind.git_url(), &root.join(CLIENT_PATH))
    }

    /// 必須の認証サービスを初期化する
    ///
    /// 宣言フェーズの先頭で必ず呼ばれる。レジストリの先頭エントリに
    /// なることで `auth` がデータベースリストの固定先頭になる。
    pub fn declare_auth(&mut self, root: &Path, choice: VariantChoice) -> anyhow::Result<()> {
        let variant = self.resolve_variant(root, AUTH_SERVICE_NAME, AUTH_TEMPLATE_GIT_URL, choice)?;
        self.registry
            .declare(ServiceDescriptor::auth(variant))
            .context("認証サービスの宣言に失敗しました")?;
        Ok(())
    }

    /// 入力されたサービス名を検証し、正規のサービス名を返す
    ///
    /// 失敗は再入力可能な宣言エラー（レジストリの状態は変わらない）。
    pub fn validate_new_service(&self, input: &str) -> CoreResult<String> {
        validate_service_name(input)?;
        let trimmed = input.trim();
        let full = if trimmed.ends_with(SERVICE_NAME_SUFFIX) {
            trimmed.to_string()
        } else {
            format!("{trimmed}{SERVICE_NAME_SUFFIX}")
        };
        if self.registry.contains(&full) {
            return Err(ScaffoldError::DuplicateName(full));
        }
        let env_var = derive_secret_env_name(&full);
        if self.registry.contains_secret_env(&env_var) {
            return Err(ScaffoldError::DuplicateSecretEnvName(env_var));
        }
        Ok(full)
    }

    /// 検証済みのサービス名でサービスを宣言する
    ///
    /// コラボレータの失敗（クローン・タグ解決）は致命的で、ワークフロー
    /// 全体を中断する。
    pub fn declare_service(
        &mut self,
        root: &Path,
        name: &str,
        choice: VariantChoice,
    ) -> anyhow::Result<()> {
        let variant = self.resolve_variant(root, name, SERVICE_TEMPLATE_GIT_URL, choice)?;
        self.registry
            .declare(ServiceDescriptor::new(name, variant))
            .with_context(|| format!("サービス {name} の宣言に失敗しました"))?;
        debug!(service = name, "Service scaffolded");
        Ok(())
    }

    /// バリアント選択を解決する
    ///
    /// ソースビルドはテンプレートのクローン、pullはリリースタグ解決を伴う。
    fn resolve_variant(
        &self,
        root: &Path,
        name: &str,
        template_url: &str,
        choice: VariantChoice,
    ) -> anyhow::Result<BuildVariant> {
        match choice {
            VariantChoice::BuildFromSource => {
                let path = PathBuf::from("server").join(name);
                self.fetcher.clone_repo(template_url, &root.join(&path))?;
                Ok(BuildVariant::BuildFromSource { path })
            }
            VariantChoice::PullPrebuiltImage => {
                let tag = self.releases.latest_tag(name)?;
                Ok(BuildVariant::PullPrebuiltImage {
                    image: format!("{}/{name}:{tag}", self.options.image_namespace),
                })
            }
        }
    }

    pub fn declared_services(&self) -> usize {
        self.registry.len()
    }

    /// レジストリを封印し、全出力ドキュメントをメモリ上で生成する
    ///
    /// すべてのジェネレータが成功した場合のみ `ScaffoldOutput` を返す。
    pub fn finish(mut self) -> anyhow::Result<ScaffoldOutput> {
        let mut provisioner = SecretProvisioner::new();
        let sealed = self.registry.seal(&mut provisioner);

        let bundle = ComposeDocumentBuilder::new(&sealed)
            .build()
            .context("composeドキュメントの生成に失敗しました")?;
        let (env_real, env_example) =
            EnvFileComposer::new(&sealed, &self.options.project_name).compose();
        let pipelines = PipelineAssembler::new()
            .context("CIフラグメントの初期化に失敗しました")?
            .assemble(&sealed)
            .context("CIパイプラインの組み立てに失敗しました")?;

        let files = vec![
            (PathBuf::from(COMPOSE_FILE), bundle.base.to_yaml()?),
            (PathBuf::from(COMPOSE_LOCAL_FILE), bundle.local.to_yaml()?),
            (PathBuf::from(COMPOSE_DEPLOY_FILE), bundle.deploy.to_yaml()?),
            (
                PathBuf::from(COMPOSE_DEPLOY_DEVELOP_FILE),
                bundle.deploy_develop.to_yaml()?,
            ),
            (
                PathBuf::from(COMPOSE_DEPLOY_STAGE_FILE),
                bundle.deploy_stage.to_yaml()?,
            ),
            (
                PathBuf::from(COMPOSE_DEPLOY_PRODUCTION_FILE),
                bundle.deploy_production.to_yaml()?,
            ),
            (PathBuf::from(DOT_ENV_FILE), env_real.render()),
            (PathBuf::from(DOT_ENV_EXAMPLE_FILE), env_example.render()),
            (PathBuf::from(DEPLOY_PIPELINE_FILE), pipelines.deploy),
            (PathBuf::from(TEST_PIPELINE_FILE), pipelines.test),
            (PathBuf::from(".gitignore"), GITIGNORE.to_string()),
            (
                PathBuf::from("server/proxy/Dockerfile"),
                PROXY_DOCKERFILE.to_string(),
            ),
            (
                PathBuf::from("server/proxy/default.conf"),
                PROXY_NGINX_CONF.to_string(),
            ),
        ];

        info!(
            services = sealed.services().len(),
            files = files.len(),
            "Scaffold generation complete"
        );
        Ok(ScaffoldOutput { files })
    }
}
