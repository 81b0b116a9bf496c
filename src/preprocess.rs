use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::types::{InputTensor, PredictError, MODEL_INPUT_SIZE};

const WHITE: image::Rgba<u8> = image::Rgba([255, 255, 255, 255]);

/// 描画面を 28x28 のグリッドに縮小する
///
/// 白で塗りつぶしたオフスクリーンバッファに、元画像全体を
/// バイキュービック補間で縮小して重ねる。最近傍補間は細い線が
/// 途切れて学習データの分布と合わなくなるため使わない。
/// 何も描かれていない面は一様な白のまま返る。
pub fn resample_to_grid(surface: &RgbaImage) -> RgbaImage {
    let size = MODEL_INPUT_SIZE as u32;
    let mut grid = RgbaImage::from_pixel(size, size, WHITE);
    let scaled = imageops::resize(surface, size, size, FilterType::CatmullRom);
    imageops::overlay(&mut grid, &scaled, 0, 0);
    grid
}

/// 28x28 グリッドをモデル入力テンソルへ変換する
///
/// 全784セルを行優先で走査し、赤チャンネルのみを読む
/// （内容はグレースケールなので他チャンネルは冗長）。
/// 各値は `(255 - sample) / 255.0` で反転・正規化する。
/// 学習済みモデルはインク=高輝度・背景=低輝度を前提としており、
/// この反転を欠くと予測が静かに崩れる。
pub fn normalize_grid(grid: &RgbaImage) -> Result<InputTensor, PredictError> {
    let size = MODEL_INPUT_SIZE as u32;
    if grid.width() != size || grid.height() != size {
        return Err(PredictError::ContractViolation(format!(
            "grid is {}x{}, expected {}x{}",
            grid.width(),
            grid.height(),
            size,
            size
        )));
    }

    let mut values = Vec::with_capacity(MODEL_INPUT_SIZE * MODEL_INPUT_SIZE);
    for y in 0..size {
        for x in 0..size {
            let sample = grid.get_pixel(x, y).0[0];
            values.push((255.0 - sample as f32) / 255.0);
        }
    }
    InputTensor::from_values(values)
}

/// 描画面からモデル入力テンソルまでの一括変換
pub fn tensor_from_surface(surface: &RgbaImage) -> Result<InputTensor, PredictError> {
    let grid = resample_to_grid(surface);
    normalize_grid(&grid)
}
