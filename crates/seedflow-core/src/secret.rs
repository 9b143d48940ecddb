//! シークレット生成
//!
//! サービスごとの開発用シークレット値を生成する。封印時に一度だけ
//! 生成され、以後は参照のみ（再生成しない）。暗号論的強度は要求しない
//! 開発環境向けの値だが、`StdRng` なのでより強い生成器への差し替えは
//! 契約を変えずに可能。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// シークレット値の文字アルファベット（英大小文字・数字・記号5種）
const SECRET_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789@#%^*";

/// 既定のシークレット長
pub const DEFAULT_SECRET_LEN: usize = 32;

/// シークレットプロビジョナー
pub struct SecretProvisioner {
    rng: StdRng,
}

impl SecretProvisioner {
    /// OSエントロピーから初期化
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// 固定シードから初期化（テスト用の決定的生成）
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// 既定長のシークレット値を生成
    pub fn mint(&mut self) -> String {
        self.mint_with_len(DEFAULT_SECRET_LEN)
    }

    /// 指定長のシークレット値を生成（アルファベットから一様に抽選）
    pub fn mint_with_len(&mut self, len: usize) -> String {
        (0..len)
            .map(|_| {
                let idx = self.rng.random_range(0..SECRET_ALPHABET.len());
                SECRET_ALPHABET[idx] as char
            })
            .collect()
    }
}

impl Default for SecretProvisioner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mint_length_and_alphabet() {
        let mut provisioner = SecretProvisioner::new();
        let value = provisioner.mint();
        assert_eq!(value.len(), DEFAULT_SECRET_LEN);
        assert!(value.bytes().all(|b| SECRET_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_mint_custom_length() {
        let mut provisioner = SecretProvisioner::from_seed(3);
        assert_eq!(provisioner.mint_with_len(64).len(), 64);
        assert_eq!(provisioner.mint_with_len(0).len(), 0);
    }

    /// 同じシードなら同じ系列、連続生成は異なる値
    #[test]
    fn test_seeded_determinism() {
        let mut a = SecretProvisioner::from_seed(99);
        let mut b = SecretProvisioner::from_seed(99);
        let first_a = a.mint();
        let first_b = b.mint();
        assert_eq!(first_a, first_b);
        assert_ne!(first_a, a.mint());
    }
}
