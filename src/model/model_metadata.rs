//! モデルメタデータの定義と永続化
//!
//! tar.gz形式でモデルと関連するメタデータを保存・読み込みします。
//!
//! ## 入力テンソルの仕様
//! - 形状: (1, 28, 28, 1)、float32
//! - 値域: [0.0, 1.0] - 白背景=0.0、黒インク=1.0（輝度反転済み）
//! - ラベル表: 8クラス。学習ノートブックが1始まりだった名残で
//!   インデックス0は空のプレースホルダ

#[cfg(feature = "ml")]
use anyhow::{bail, Context, Result};
#[cfg(feature = "ml")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "ml")]
use crate::types::{MODEL_INPUT_SIZE, NUM_CLASSES};

/// モデルメタデータ
///
/// tar.gz形式で保存される情報：
/// - metadata.json: このメタデータ（JSON形式）
/// - model.bin: モデルの重み（バイナリ）
#[cfg(feature = "ml")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// 全クラスラベル（インデックス0のプレースホルダを含む）
    /// 例: ["", "cat", "airplane", "jail", ...]
    pub class_labels: Vec<String>,

    /// モデル入力サイズ（一辺のピクセル数、通常28）
    pub model_input_size: u32,

    /// 入力チャンネル数
    /// スケッチはグレースケールとして扱うため常に1
    pub input_channels: u32,

    /// 学習エポック数（未学習の初期重みの場合は0）
    pub num_epochs: u32,

    /// モデルの学習時刻（ISO8601形式）
    pub trained_at: String,
}

#[cfg(feature = "ml")]
impl ModelMetadata {
    /// 新しいメタデータを作成
    pub fn new(class_labels: Vec<String>, num_epochs: u32) -> Self {
        let trained_at = chrono::Local::now().to_rfc3339();

        Self {
            class_labels,
            model_input_size: MODEL_INPUT_SIZE as u32,
            input_channels: 1,
            num_epochs,
            trained_at,
        }
    }

    /// 既定の8クラスラベル表でメタデータを作成
    pub fn with_default_labels(num_epochs: u32) -> Self {
        let labels = crate::types::CLASS_NAMES
            .iter()
            .map(|s| s.to_string())
            .collect();
        Self::new(labels, num_epochs)
    }

    /// 入力テンソルの宣言形状 (batch, height, width, channel)
    pub fn input_shape(&self) -> [usize; 4] {
        [
            1,
            self.model_input_size as usize,
            self.model_input_size as usize,
            self.input_channels as usize,
        ]
    }

    /// 前処理パイプラインと整合しているか検証
    ///
    /// 不一致のモデルで推論を始めると予測が静かに崩れるため、
    /// ロード時点で弾く。
    pub fn validate(&self) -> Result<()> {
        if self.class_labels.len() != NUM_CLASSES {
            bail!(
                "label table has {} entries, expected {}",
                self.class_labels.len(),
                NUM_CLASSES
            );
        }
        if self.model_input_size as usize != MODEL_INPUT_SIZE {
            bail!(
                "model input size is {}, expected {}",
                self.model_input_size,
                MODEL_INPUT_SIZE
            );
        }
        if self.input_channels != 1 {
            bail!(
                "input channel count is {}, expected 1",
                self.input_channels
            );
        }
        Ok(())
    }

    /// メタデータをJSON文字列に変換
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize metadata to JSON")
    }

    /// JSON文字列からメタデータを生成
    pub fn from_json_string(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to deserialize metadata from JSON")
    }
}
