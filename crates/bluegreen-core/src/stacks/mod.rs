//! スタック定義

mod build_image;
mod network;
mod pipeline;

pub use build_image::*;
pub use network::*;
pub use pipeline::*;

use serde::{Deserialize, Serialize};
use std::fmt;

/// デプロイ系統
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Blue,
    Green,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Blue, Variant::Green];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blue => "blue",
            Self::Green => "green",
        }
    }

    /// この系統のイメージタグ（同時にビルドブランチ名）
    pub fn image_tag(&self) -> &'static str {
        match self {
            Self::Blue => "testblue",
            Self::Green => "testgreen",
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Self::Blue => Self::Green,
            Self::Green => Self::Blue,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 各系統のサービス desired count
///
/// 両系統は独立に設定でき、ターゲットグループの登録には影響しない。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCounts {
    pub blue: u32,
    pub green: u32,
}

impl Default for VariantCounts {
    fn default() -> Self {
        Self { blue: 0, green: 2 }
    }
}

impl VariantCounts {
    pub fn get(&self, variant: Variant) -> u32 {
        match variant {
            Variant::Blue => self.blue,
            Variant::Green => self.green,
        }
    }
}

/// ビルドブランチとビルドプロジェクトの対応
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildWiring {
    /// `testblue` ブランチが `testgreen` タグのプロジェクトを、
    /// `testgreen` ブランチが `testblue` タグのプロジェクトを起動する
    #[default]
    Crossed,
    /// 各ブランチが同名タグのプロジェクトを起動する
    Direct,
}

impl BuildWiring {
    /// ブランチ系統に対して起動するプロジェクトの系統
    pub fn project_for(&self, branch: Variant) -> Variant {
        match self {
            Self::Crossed => branch.other(),
            Self::Direct => branch,
        }
    }
}
