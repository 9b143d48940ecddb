use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScaffoldError {
    #[error("サービス名が重複しています: {0}")]
    DuplicateName(String),

    #[error("シークレット環境変数名が重複しています: {0}")]
    DuplicateSecretEnvName(String),

    #[error("サービス名が不正です（空または空白のみ）: {0:?}")]
    InvalidName(String),

    #[error("レジストリは封印済みです。宣言フェーズの後に declare はできません")]
    RegistrySealed,

    #[error("ベースドキュメントに存在しないサービスへの参照: {0}")]
    UnknownServiceReference(String),

    #[error("YAMLシリアライズエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ScaffoldError>;
