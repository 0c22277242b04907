use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynthError {
    #[error("論理IDが重複しています: {logical_id} (スタック: {stack})")]
    DuplicateLogicalId { stack: String, logical_id: String },

    #[error("未定義のリソースを参照しています: {reference} (スタック: {stack}, 参照元: {source_id})")]
    UnresolvedReference {
        stack: String,
        source_id: String,
        reference: String,
    },

    #[error("スタックIDが重複しています: {0}")]
    DuplicateStack(String),

    #[error("無効な識別子: '{0}'\n英数字を1文字以上含める必要があります")]
    InvalidIdentifier(String),

    #[error("テンプレート展開エラー: {template}\n理由: {message}")]
    Template { template: String, message: String },

    #[error("シリアライズエラー: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SynthError>;
