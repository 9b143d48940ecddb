//! リリースインデックスコラボレータ
//!
//! pullバリアントのイメージ参照に使う最新リリースタグを問い合わせる。
//! 失敗はリトライしない：タグが解決できなければデプロイイメージ参照を
//! 作れないため、ワークフロー全体を即座に中断する。

use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// リリースインデックスの外部コラボレータ
pub trait ReleaseIndex {
    /// リポジトリの最新リリースタグを返す
    fn latest_tag(&self, repo: &str) -> anyhow::Result<String>;
}

/// GitHub Releases APIを使う実装
pub struct GithubReleaseIndex {
    owner: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct LatestRelease {
    tag_name: String,
}

impl GithubReleaseIndex {
    pub fn new(owner: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("seedflow/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("HTTPクライアントの初期化に失敗しました")?;
        Ok(Self {
            owner: owner.into(),
            client,
        })
    }
}

impl ReleaseIndex for GithubReleaseIndex {
    fn latest_tag(&self, repo: &str) -> anyhow::Result<String> {
        let url = format!(
            "https://api.github.com/repos/{}/{}/releases/latest",
            self.owner, repo
        );
        debug!(%url, "Querying latest release tag");

        let response = self
            .client
            .get(&url)
            .send()
            .with_context(|| format!("リリースインデックスへの問い合わせに失敗しました: {repo}"))?;
        if !response.status().is_success() {
            anyhow::bail!(
                "リリースインデックスがエラーを返しました: {repo} ({})",
                response.status()
            );
        }

        let release: LatestRelease = response
            .json()
            .with_context(|| format!("リリース応答のパースに失敗しました: {repo}"))?;
        Ok(release.tag_name)
    }
}
