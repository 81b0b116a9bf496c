//! アプリケーション設定管理モジュール
//!
//! モデルパスや描画面サイズなどをJSON形式で保存・読み込みします。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// モデル設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// 使用するモデルファイル（tar.gz）のパス
    pub model_path: String,
    /// 分類クラス数（インデックス0のプレースホルダを含む）
    pub num_classes: usize,
    /// ドロップアウト率
    pub dropout: f64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            model_path: "model/sketch_cnn.tar.gz".to_string(),
            num_classes: 8,
            dropout: 0.5,
        }
    }
}

/// 描画面設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasSettings {
    /// 描画面の幅（ピクセル）
    pub width: u32,
    /// 描画面の高さ（ピクセル）
    pub height: u32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            width: 280,
            height: 280,
        }
    }
}

/// アプリケーション設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// モデル設定
    pub model: ModelSettings,
    /// 描画面設定
    pub canvas: CanvasSettings,
    /// 最後に分類したストロークファイルのパス
    #[serde(default)]
    pub last_sketch_path: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: ModelSettings::default(),
            canvas: CanvasSettings::default(),
            last_sketch_path: None,
        }
    }
}

impl AppConfig {
    /// 設定ファイルのデフォルトパス
    pub fn default_path() -> PathBuf {
        PathBuf::from("config.json")
    }

    /// 設定を読み込む
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// デフォルトパスから設定を読み込む、存在しない場合はデフォルト設定を返す
    pub fn load_or_default() -> Self {
        let path = Self::default_path();
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => {
                    println!("設定ファイルを読み込みました: {}", path.display());
                    config.sanitized()
                }
                Err(e) => {
                    eprintln!(
                        "警告: 設定ファイルの読み込みに失敗しました ({}): {}",
                        path.display(),
                        e
                    );
                    eprintln!("デフォルト設定を使用します");
                    Self::default()
                }
            }
        } else {
            Self::default()
        }
    }

    /// 描画面サイズを検証し、0が含まれる場合は既定値に戻す
    ///
    /// サイズ0の描画面は作れないため、手編集で壊れた設定は既定値へ落とす。
    fn sanitized(mut self) -> Self {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            eprintln!(
                "警告: 描画面サイズが不正です ({}x{})。既定値を使用します",
                self.canvas.width, self.canvas.height
            );
            self.canvas = CanvasSettings::default();
        }
        self
    }

    /// 設定を保存する
    pub fn save<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// デフォルトパスに設定を保存する
    pub fn save_default(&self) -> anyhow::Result<()> {
        let path = Self::default_path();
        self.save(&path)?;
        println!("設定ファイルを保存しました: {}", path.display());
        Ok(())
    }

    /// モデルパスを設定
    pub fn set_model_path(&mut self, path: String) {
        self.model.model_path = path;
    }

    /// 最後に分類したストロークファイルのパスを更新
    pub fn update_last_sketch_path<P: AsRef<Path>>(&mut self, path: P) {
        self.last_sketch_path = Some(path.as_ref().to_string_lossy().to_string());
    }

    /// 設定情報を表示
    pub fn display(&self) {
        println!("=== アプリケーション設定 ===");
        println!("モデルパス: {}", self.model.model_path);
        println!("分類クラス数: {}", self.model.num_classes);
        println!("ドロップアウト率: {}", self.model.dropout);
        println!("描画面サイズ: {}x{}", self.canvas.width, self.canvas.height);

        if let Some(ref sketch) = self.last_sketch_path {
            println!("最後に分類したスケッチ: {}", sketch);
        }
        println!("========================\n");
    }
}
