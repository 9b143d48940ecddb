//! Seedflow CI
//!
//! ビルドバリアントごとに選択・パラメータ化した再利用フラグメントを
//! 連結して、デプロイ用とテスト用の2つのパイプラインドキュメントを
//! 組み立てます。

pub mod fragments;

use seedflow_core::{BuildVariant, SealedRegistry};
use tera::{Context, Tera};
use thiserror::Error;
use tracing::debug;

/// デプロイパイプラインのファイル名
pub const DEPLOY_PIPELINE_FILE: &str = ".gitlab-ci.deploy.yml";
/// テストパイプラインのファイル名
pub const TEST_PIPELINE_FILE: &str = ".gitlab-ci.test.yml";

#[derive(Error, Debug)]
pub enum CiError {
    /// 期待した名前のフラグメントが登録されていない。出力パイプラインが
    /// 黙ってステージを欠落させるため、縮退運転はせず即座に失敗する。
    #[error("フラグメントテンプレートが見つかりません: {0}")]
    MissingFragmentTemplate(String),

    #[error("フラグメント展開エラー: {name}\n理由: {source}")]
    Render {
        name: String,
        #[source]
        source: tera::Error,
    },
}

pub type Result<T> = std::result::Result<T, CiError>;

/// 生成されたパイプラインドキュメントのペア
#[derive(Debug, Clone)]
pub struct Pipelines {
    pub deploy: String,
    pub test: String,
}

/// デプロイパイプラインのフラグメント選択（バリアントで完全に決まる）
fn deploy_fragments(variant: &BuildVariant) -> [&'static str; 3] {
    match variant {
        BuildVariant::BuildFromSource { .. } => [
            fragments::BUILD_IMAGE,
            fragments::MIGRATE_BUILD,
            fragments::DEPLOY_BUILD,
        ],
        BuildVariant::PullPrebuiltImage { .. } => [
            fragments::PULL_IMAGE,
            fragments::MIGRATE_PULL,
            fragments::DEPLOY_PULL,
        ],
    }
}

/// テストパイプラインのフラグメント選択
///
/// pullバリアントはこのプロジェクトではローカルテストしないため空。
fn test_fragments(variant: &BuildVariant) -> &'static [&'static str] {
    match variant {
        BuildVariant::BuildFromSource { .. } => &[fragments::LINT, fragments::UNIT_TEST],
        BuildVariant::PullPrebuiltImage { .. } => &[],
    }
}

/// CIパイプラインアセンブラ
pub struct PipelineAssembler {
    tera: Tera,
}

impl PipelineAssembler {
    /// 組み込みフラグメント一式で初期化
    pub fn new() -> Result<Self> {
        Self::with_fragments(fragments::BUILTIN_FRAGMENTS)
    }

    /// 外部から供給されたフラグメント一式で初期化
    pub fn with_fragments(fragments: &[(&str, &str)]) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(fragments.to_vec())
            .map_err(|source| CiError::Render {
                name: "<setup>".to_string(),
                source,
            })?;
        Ok(Self { tera })
    }

    /// 封印済みレジストリから2つのパイプラインを組み立てる
    ///
    /// サービスは宣言順に、フラグメントは固定順に連結され、各ブロックは
    /// 空行で区切られる。
    pub fn assemble(&self, registry: &SealedRegistry) -> Result<Pipelines> {
        let mut deploy_blocks = vec![Self::stage_header(&["build", "migrate", "deploy"])];
        let mut test_blocks = vec![Self::stage_header(&["lint", "test"])];

        for descriptor in registry.services() {
            for name in deploy_fragments(&descriptor.variant) {
                deploy_blocks.push(self.render_fragment(name, &descriptor.name)?);
            }
            for name in test_fragments(&descriptor.variant) {
                test_blocks.push(self.render_fragment(name, &descriptor.name)?);
            }
        }

        debug!(
            deploy_blocks = deploy_blocks.len(),
            test_blocks = test_blocks.len(),
            "CI pipelines assembled"
        );
        Ok(Pipelines {
            deploy: Self::join_blocks(deploy_blocks),
            test: Self::join_blocks(test_blocks),
        })
    }

    /// フラグメント1つをサービス名で展開する
    fn render_fragment(&self, name: &str, service: &str) -> Result<String> {
        if !self.tera.get_template_names().any(|n| n == name) {
            return Err(CiError::MissingFragmentTemplate(name.to_string()));
        }
        let mut context = Context::new();
        context.insert("service", service);
        self.tera.render(name, &context).map_err(|source| CiError::Render {
            name: name.to_string(),
            source,
        })
    }

    fn stage_header(stages: &[&str]) -> String {
        let mut out = String::from("stages:\n");
        for stage in stages {
            out.push_str(&format!("  - {stage}\n"));
        }
        out.trim_end().to_string()
    }

    fn join_blocks(blocks: Vec<String>) -> String {
        let mut out = blocks.join("\n\n");
        out.push('\n');
        out
    }
}
