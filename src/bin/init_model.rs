//! 初期重みのモデルアーカイブを生成する簡易バイナリ
//!
//! 重みは学習を経ていない初期値のため分類品質はないが、
//! パイプライン全体の動作確認に使える。

use std::path::PathBuf;

use burn::backend::NdArray;
use burn::module::Module;
use burn::record::{BinBytesRecorder, FullPrecisionSettings, Recorder};

use sketch_classifier::ml::ModelConfig;
use sketch_classifier::model::{print_metadata_info, save_model_with_metadata, ModelMetadata};
use sketch_classifier::types::{MODEL_INPUT_SIZE, NUM_CLASSES};

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let output_path = if args.len() > 1 {
        PathBuf::from(&args[1])
    } else {
        PathBuf::from("model/sketch_cnn.tar.gz")
    };

    println!("=== モデルアーカイブ生成 ===");
    println!("出力先: {}", output_path.display());

    let device = Default::default();
    let config = ModelConfig {
        num_classes: NUM_CLASSES,
        dropout: 0.0,
        image_size: MODEL_INPUT_SIZE,
    };
    let model = config.init::<NdArray>(&device);

    let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
    let binary = match recorder.record(model.into_record(), ()) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("✗ モデル重みのシリアライズに失敗しました: {:?}", e);
            return;
        }
    };
    println!("✓ モデル重みを生成しました ({} bytes)", binary.len());

    let metadata = ModelMetadata::with_default_labels(0);
    if let Err(e) = save_model_with_metadata(&output_path, &metadata, &binary) {
        eprintln!("✗ アーカイブの保存に失敗しました: {}", e);
        return;
    }

    println!("✓ アーカイブを保存しました");
    print_metadata_info(&metadata);
}
