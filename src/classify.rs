//! スケッチ分類パイプライン
//!
//! 描画面のスナップショットから分類結果までの変換を束ねます。

use image::RgbaImage;

use crate::decision;
use crate::preprocess;
use crate::types::{InputTensor, PredictError, Prediction, Predictor, MODEL_INPUT_SIZE};

/// 描画面スナップショットを分類する
///
/// リサンプリング、正規化、推論、決定規則の順に実行する。
/// テンソルは推論に所有権ごと渡り、呼び出し後に残らない。
pub fn classify_surface(
    surface: &RgbaImage,
    predictor: &dyn Predictor,
) -> Result<Prediction, PredictError> {
    let tensor = preprocess::tensor_from_surface(surface)?;
    log_input(&tensor);

    let probabilities = predictor.predict(tensor)?;
    println!("[Predict] 確率ベクトル: {:?}", probabilities);

    let prediction = decision::decide(&probabilities, predictor.class_labels())?;
    println!(
        "[Predict] 結果: {} ({}%)",
        prediction.label,
        prediction.confidence_percent()
    );

    Ok(prediction)
}

/// 入力テンソルの統計をコンソールに出力する
fn log_input(tensor: &InputTensor) {
    let values = tensor.values();
    let min = values.iter().cloned().fold(f32::INFINITY, f32::min);
    let max = values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);

    println!("[Predict] 入力テンソル形状: {:?}", tensor.shape());
    println!("[Predict] 入力値の範囲: {:.3} - {:.3}", min, max);

    // 左上5x5のサンプル値
    let mut sample = Vec::with_capacity(25);
    for y in 0..5 {
        for x in 0..5 {
            sample.push(values[y * MODEL_INPUT_SIZE + x]);
        }
    }
    println!("[Predict] 入力サンプル (左上5x5): {:?}", sample);
}
