//! バインドマウント定義

use serde::{Deserialize, Serialize};
use std::fmt;

/// バインドマウント定義
///
/// compose short syntax（`host:container:mode`）の文字列として
/// シリアライズされる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindMount {
    pub host: String,
    pub container: String,
    pub read_only: bool,
}

impl BindMount {
    /// 読み書き可能なバインドマウントを作成
    pub fn read_write(host: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            container: container.into(),
            read_only: false,
        }
    }

    /// `host:container:mode` 形式の文字列からパース
    ///
    /// mode省略時は読み書き可能として扱う。
    pub fn parse(s: &str) -> Option<Self> {
        let mut parts = s.splitn(3, ':');
        let host = parts.next()?.to_string();
        let container = parts.next()?.to_string();
        let read_only = matches!(parts.next(), Some("ro"));
        Some(Self {
            host,
            container,
            read_only,
        })
    }
}

impl fmt::Display for BindMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = if self.read_only { "ro" } else { "rw" };
        write!(f, "{}:{}:{}", self.host, self.container, mode)
    }
}

impl Serialize for BindMount {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for BindMount {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("不正なマウント指定: {s}")))
    }
}
