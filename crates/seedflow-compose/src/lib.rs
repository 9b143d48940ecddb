//! Seedflow compose
//!
//! 封印済みレジストリからcomposeドキュメント一式と環境変数
//! ドキュメント（実体・サンプル）を生成します。

pub mod compose;
pub mod envfile;

pub use compose::{BROKER_IMAGE, ComposeBundle, ComposeDocumentBuilder, STORE_IMAGE, verify_overlay};
pub use envfile::{EnvDocument, EnvFileComposer, EnvLine};

/// ベースcomposeドキュメントのファイル名
pub const COMPOSE_FILE: &str = "docker-compose.yml";
/// ローカルオーバーレイのファイル名
pub const COMPOSE_LOCAL_FILE: &str = "docker-compose.local.yml";
/// デプロイ統括ドキュメントのファイル名
pub const COMPOSE_DEPLOY_FILE: &str = "docker-compose.deploy.yml";
/// ステージ別プレースホルダのファイル名
pub const COMPOSE_DEPLOY_DEVELOP_FILE: &str = "docker-compose.deploy.develop.yml";
pub const COMPOSE_DEPLOY_STAGE_FILE: &str = "docker-compose.deploy.stage.yml";
pub const COMPOSE_DEPLOY_PRODUCTION_FILE: &str = "docker-compose.deploy.production.yml";
/// 環境変数ドキュメントのファイル名
pub const DOT_ENV_FILE: &str = ".env";
pub const DOT_ENV_EXAMPLE_FILE: &str = ".env.example";
