//! モデルメタデータを使用した推論設定
//!
//! 保存されたモデルメタデータを読み込んで推論に必要な情報を取得します。

#[cfg(feature = "ml")]
use anyhow::{Context, Result};
#[cfg(feature = "ml")]
use std::path::Path;

#[cfg(feature = "ml")]
use crate::model::model_metadata::ModelMetadata;
#[cfg(feature = "ml")]
use crate::model::model_storage;

/// モデルメタデータから推論用情報を取得
#[cfg(feature = "ml")]
#[derive(Debug)]
pub struct InferenceConfig {
    /// 全クラスラベル（インデックス0のプレースホルダを含む）
    pub class_labels: Vec<String>,

    /// モデル入力解像度（一辺）
    pub model_input_size: u32,

    /// 入力チャンネル数
    pub input_channels: u32,
}

#[cfg(feature = "ml")]
impl InferenceConfig {
    /// メタデータからInferenceConfigを作成
    pub fn from_metadata(metadata: &ModelMetadata) -> Self {
        Self {
            class_labels: metadata.class_labels.clone(),
            model_input_size: metadata.model_input_size,
            input_channels: metadata.input_channels,
        }
    }

    /// モデルファイルから推論設定を読み込む
    pub fn load_from_model(model_path: &Path) -> Result<Self> {
        let metadata = model_storage::load_metadata(model_path)
            .context("Failed to load model metadata")?;
        Ok(Self::from_metadata(&metadata))
    }

    /// クラス数を取得
    pub fn num_classes(&self) -> usize {
        self.class_labels.len()
    }

    /// クラスインデックスからラベルを取得
    pub fn class_index_to_label(&self, index: usize) -> Option<&str> {
        self.class_labels.get(index).map(|s| s.as_str())
    }

    /// 設定情報を表示
    pub fn print_info(&self) {
        println!("\n=== 推論設定 ===");
        println!("クラスラベル: {:?}", self.class_labels);
        println!(
            "モデル入力サイズ: {}x{}",
            self.model_input_size, self.model_input_size
        );
        println!("入力チャンネル数: {}", self.input_channels);
        println!("総クラス数: {}", self.num_classes());
        println!("==================");
    }
}
