use crate::types::{PredictError, Prediction};

/// 確率ベクトルから分類結果を決定する
///
/// 最大確率のインデックスを線形走査で求める。同値の場合は
/// 先に現れたインデックスが勝つ（「より大きい」ときだけ更新し、
/// 等しいときは置き換えないため）。
///
/// インデックス0のプレースホルダも特別扱いしない。モデルが
/// 最大確率を割り当てた場合は空ラベルがそのまま表に出る。
pub fn decide(probabilities: &[f32], labels: &[String]) -> Result<Prediction, PredictError> {
    if probabilities.is_empty() {
        return Err(PredictError::ContractViolation(
            "probability vector is empty".to_string(),
        ));
    }
    if probabilities.len() != labels.len() {
        return Err(PredictError::ContractViolation(format!(
            "probability vector has {} entries but label table has {}",
            probabilities.len(),
            labels.len()
        )));
    }

    let mut max_index = 0;
    let mut max_prob = probabilities[0];
    for (i, &p) in probabilities.iter().enumerate().skip(1) {
        if p > max_prob {
            max_prob = p;
            max_index = i;
        }
    }

    Ok(Prediction {
        label: labels[max_index].clone(),
        confidence: max_prob,
    })
}
