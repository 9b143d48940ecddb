//! 組み込みフラグメントテンプレート
//!
//! 各フラグメントはサービス名1つだけを置換トークンに持つTeraテンプレート。
//! スキャフォールド後のプロジェクトが自由に書き換える前提の雛形。

/// イメージビルド（ソースビルドバリアント、デプロイパイプライン）
pub const BUILD_IMAGE: &str = "build-image";
/// イメージpull（pullバリアント、デプロイパイプライン）
pub const PULL_IMAGE: &str = "pull-image";
/// マイグレーション実行（ソースビルドバリアント）
pub const MIGRATE_BUILD: &str = "migrate-build";
/// マイグレーション実行（pullバリアント）
pub const MIGRATE_PULL: &str = "migrate-pull";
/// デプロイ（ソースビルドバリアント）
pub const DEPLOY_BUILD: &str = "deploy-build";
/// デプロイ（pullバリアント）
pub const DEPLOY_PULL: &str = "deploy-pull";
/// 静的解析（テストパイプライン）
pub const LINT: &str = "lint";
/// ユニットテスト（テストパイプライン）
pub const UNIT_TEST: &str = "unit-test";

/// 組み込みフラグメント一式（名前, テンプレート本体）
pub const BUILTIN_FRAGMENTS: &[(&str, &str)] = &[
    (
        BUILD_IMAGE,
        r#"build:{{ service }}:
  stage: build
  script:
    - docker build --pull -t ${CI_REGISTRY_IMAGE}/{{ service }}:${CI_COMMIT_SHORT_SHA} server/{{ service }}
    - docker push ${CI_REGISTRY_IMAGE}/{{ service }}:${CI_COMMIT_SHORT_SHA}"#,
    ),
    (
        PULL_IMAGE,
        r#"pull:{{ service }}:
  stage: build
  script:
    - docker compose pull {{ service }}"#,
    ),
    (
        MIGRATE_BUILD,
        r#"migrate:{{ service }}:
  stage: migrate
  script:
    - docker compose run --rm --no-deps {{ service }} ./artisan migrate --force"#,
    ),
    (
        MIGRATE_PULL,
        r#"migrate:{{ service }}:
  stage: migrate
  script:
    - docker compose pull {{ service }}
    - docker compose run --rm --no-deps {{ service }} ./artisan migrate --force"#,
    ),
    (
        DEPLOY_BUILD,
        r#"deploy:{{ service }}:
  stage: deploy
  script:
    - docker compose -f docker-compose.yml -f docker-compose.deploy.yml up --detach --build {{ service }}"#,
    ),
    (
        DEPLOY_PULL,
        r#"deploy:{{ service }}:
  stage: deploy
  script:
    - docker compose -f docker-compose.yml -f docker-compose.deploy.yml up --detach {{ service }}"#,
    ),
    (
        LINT,
        r#"lint:{{ service }}:
  stage: lint
  script:
    - docker compose run --rm --no-deps {{ service }} composer lint"#,
    ),
    (
        UNIT_TEST,
        r#"test:{{ service }}:
  stage: test
  script:
    - docker compose run --rm {{ service }} composer test"#,
    ),
];
