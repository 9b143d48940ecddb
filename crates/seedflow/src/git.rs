//! ソース取得コラボレータ
//!
//! テンプレートリポジトリのチェックアウトを取得する。クローンは
//! 一時的なネットワーク断に備えて有限回リトライするが、リトライは
//! 必ず最初に構築した引数列をそのまま再送する。

use anyhow::{Context, bail};
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

/// ソースチェックアウト取得の外部コラボレータ
pub trait SourceFetcher {
    /// `url` を `dest` にクローンし、テンプレート履歴（`.git`）を取り除く
    fn clone_repo(&self, url: &str, dest: &Path) -> anyhow::Result<()>;
}

/// `git` CLIを使う実装
pub struct GitCli {
    /// クローンの最大試行回数
    pub max_attempts: u32,
}

impl Default for GitCli {
    fn default() -> Self {
        Self { max_attempts: 3 }
    }
}

impl SourceFetcher for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        let dest_str = dest.display().to_string();
        // 引数列はここで一度だけ構築し、全試行で同一のものを使う
        let args = ["clone", url, dest_str.as_str()];

        with_retry(self.max_attempts, || {
            debug!(url, dest = %dest_str, "git clone");
            let status = Command::new("git")
                .args(args)
                .status()
                .context("git の起動に失敗しました")?;
            if !status.success() {
                bail!("git clone が失敗しました: {url}");
            }
            Ok(())
        })
        .with_context(|| format!("リポジトリを取得できませんでした: {url}"))?;

        // テンプレート由来の履歴は生成プロジェクトには不要
        let git_dir = dest.join(".git");
        if git_dir.exists() {
            std::fs::remove_dir_all(&git_dir)
                .with_context(|| format!("{} を削除できませんでした", git_dir.display()))?;
        }
        Ok(())
    }
}

/// 有限回リトライ
///
/// 成功するか試行回数を使い切るまで `op` を繰り返す。`op` が引数を
/// 取らないことで「リトライ時に別の引数を渡してしまう」余地を
/// 型レベルで塞いでいる。
pub fn with_retry<T>(
    max_attempts: u32,
    mut op: impl FnMut() -> anyhow::Result<T>,
) -> anyhow::Result<T> {
    let mut last_err = None;
    for attempt in 1..=max_attempts.max(1) {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                warn!(attempt, max_attempts, %err, "Retryable operation failed");
                last_err = Some(err);
            }
        }
    }
    Err(last_err.expect("少なくとも1回は試行される"))
}
