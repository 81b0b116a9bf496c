use serde::{Deserialize, Serialize};

/// モデル入力の一辺のピクセル数（28x28）
pub const MODEL_INPUT_SIZE: usize = 28;

/// 分類クラス数（先頭のプレースホルダを含む）
pub const NUM_CLASSES: usize = 8;

/// クラス名の定義
///
/// 学習ノートブックが1始まりのラベルを使っていたため、
/// インデックス0は空のプレースホルダになっている。
pub const CLASS_NAMES: [&str; NUM_CLASSES] = [
    "",
    "cat",
    "airplane",
    "jail",
    "line",
    "alarm clock",
    "baseball",
    "baseball bat",
];

/// ストローク1点分の座標
///
/// 描画面ローカル座標（ピクセル単位）。UI側で描画面の
/// バウンディング矩形によるオフセット補正を済ませてから渡す。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokePoint {
    pub x: f32,
    pub y: f32,
}

impl StrokePoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

// 描画の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawState {
    Idle,    // 待機中（ポインタが離れている）
    Drawing, // ストローク描画中
}

/// モデルに渡す入力テンソル
///
/// 形状は (1, 28, 28, 1)、値は [0.0, 1.0] に正規化済み
/// （白背景=0.0、黒インク=1.0）。`Predictor::predict` が所有権ごと
/// 受け取るため、推論の終了後にテンソルが残留することはない。
#[derive(Debug, PartialEq)]
pub struct InputTensor {
    values: Vec<f32>,
}

impl InputTensor {
    /// 宣言上のテンソル形状 (batch, height, width, channel)
    pub const SHAPE: [usize; 4] = [1, MODEL_INPUT_SIZE, MODEL_INPUT_SIZE, 1];

    /// 正規化済みの値列（行優先、784要素）からテンソルを作成
    pub fn from_values(values: Vec<f32>) -> Result<Self, PredictError> {
        let expected = MODEL_INPUT_SIZE * MODEL_INPUT_SIZE;
        if values.len() != expected {
            return Err(PredictError::ContractViolation(format!(
                "tensor has {} values, expected {}",
                values.len(),
                expected
            )));
        }
        Ok(Self { values })
    }

    pub fn shape(&self) -> [usize; 4] {
        Self::SHAPE
    }

    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// 値列を取り出してテンソルを消費する
    pub fn into_values(self) -> Vec<f32> {
        self.values
    }
}

/// 1回分の分類結果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// 分類ラベル（インデックス0が選ばれた場合は空文字列のまま）
    pub label: String,
    /// 最大クラス確率 [0.0, 1.0]
    pub confidence: f32,
}

impl Prediction {
    /// 確率を小数1桁のパーセント表記にする（例: "70.0"）
    pub fn confidence_percent(&self) -> String {
        format!("{:.1}", self.confidence * 100.0)
    }

    /// ステータス表示用の1行テキスト
    pub fn status_text(&self) -> String {
        format!(
            "{} ({}%) - debug info available",
            self.label,
            self.confidence_percent()
        )
    }
}

/// 推論1回分のエラー分類
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    /// モデルのロードが完了していない
    NotReady,
    /// 起動時のモデルロードに失敗している（縮退状態）
    LoadFailed(String),
    /// 順伝播の実行に失敗した
    Inference(String),
    /// 呼び出し契約違反（空の確率ベクトルや形状不一致など、実装側のバグ）
    ContractViolation(String),
}

impl std::fmt::Display for PredictError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PredictError::NotReady => write!(f, "model not loaded"),
            PredictError::LoadFailed(msg) => write!(f, "model load failed: {}", msg),
            PredictError::Inference(msg) => write!(f, "inference failed: {}", msg),
            PredictError::ContractViolation(msg) => write!(f, "contract violation: {}", msg),
        }
    }
}

impl std::error::Error for PredictError {}

/// 推論エンジンの呼び出し境界
///
/// 実体は `ml::InferenceEngine` だが、テストでは固定出力のスタブに
/// 差し替えられるようトレイトで切り離している。
pub trait Predictor: Send + Sync {
    /// 順伝播を1回実行して確率ベクトルを返す
    ///
    /// テンソルは所有権ごと受け取り、呼び出しの終了時点で解放される。
    /// 返り値の長さは `class_labels()` の長さと一致しなければならない。
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, PredictError>;

    /// モデルが宣言しているクラスラベル表
    fn class_labels(&self) -> &[String];
}

/// 推論結果からユーザー向けステータス文字列を組み立てる
pub fn status_text_for(result: &Result<Prediction, PredictError>) -> String {
    match result {
        Ok(pred) => pred.status_text(),
        Err(PredictError::NotReady) => "model not loaded".to_string(),
        Err(e) => format!("error: {}", e),
    }
}
