//! 対話プロンプト
//!
//! コアの合成ロジックは端末に直接触れない。ワークフローはこのトレイト
//! 経由で宣言イベントを受け取るため、テストではスクリプト化した実装に
//! 差し替えられる。

use anyhow::Context;
use colored::Colorize;
use std::io::{BufRead, Write};

/// ブロッキングのユーザー入力コラボレータ
pub trait Prompt {
    /// 1行のテキスト入力
    fn text(&mut self, message: &str) -> anyhow::Result<String>;
    /// はい/いいえ確認
    fn confirm(&mut self, message: &str) -> anyhow::Result<bool>;
    /// 選択肢から1つ選ぶ（選ばれたインデックスを返す）
    fn select(&mut self, message: &str, choices: &[&str]) -> anyhow::Result<usize>;
}

/// 標準入出力を使うプロンプト実装
pub struct StdinPrompt {
    stdin: std::io::Stdin,
}

impl StdinPrompt {
    pub fn new() -> Self {
        Self {
            stdin: std::io::stdin(),
        }
    }

    fn read_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        self.stdin
            .lock()
            .read_line(&mut line)
            .context("標準入力の読み込みに失敗しました")?;
        Ok(line.trim().to_string())
    }
}

impl Prompt for StdinPrompt {
    fn text(&mut self, message: &str) -> anyhow::Result<String> {
        print!("{} ", message.bold());
        std::io::stdout().flush()?;
        self.read_line()
    }

    fn confirm(&mut self, message: &str) -> anyhow::Result<bool> {
        loop {
            print!("{} {} ", message.bold(), "[y/N]".dimmed());
            std::io::stdout().flush()?;
            match self.read_line()?.to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "" | "n" | "no" => return Ok(false),
                _ => println!("{}", "y または n で答えてください".yellow()),
            }
        }
    }

    fn select(&mut self, message: &str, choices: &[&str]) -> anyhow::Result<usize> {
        println!("{}", message.bold());
        for (idx, choice) in choices.iter().enumerate() {
            println!("  {}. {}", idx + 1, choice.cyan());
        }
        loop {
            print!("{} ", format!("番号を選択 (1-{}):", choices.len()).dimmed());
            std::io::stdout().flush()?;
            if let Ok(n) = self.read_line()?.parse::<usize>() {
                if (1..=choices.len()).contains(&n) {
                    return Ok(n - 1);
                }
            }
            println!("{}", "不正な選択です".yellow());
        }
    }
}
