//! ストローク記録ファイルを読み込んで分類する簡易バイナリ

use std::path::{Path, PathBuf};

use sketch_classifier::model::{AppConfig, InferenceConfig};
use sketch_classifier::stroke_loader::load_strokes;
use sketch_classifier::AppState;

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: classify_strokes <strokes.json> [model.tar.gz]");
        return;
    }

    let strokes_path = PathBuf::from(&args[1]);

    let mut config = AppConfig::load_or_default();
    let model_path = if args.len() >= 3 {
        args[2].clone()
    } else {
        config.model.model_path.clone()
    };

    println!(
        "Classify strokes:\n  sketch: {}\n  model: {}",
        strokes_path.display(),
        model_path
    );

    let state = AppState::with_config(&config);

    if let Err(e) = state.load_model(&model_path).await {
        eprintln!("✗ モデルのロードに失敗しました: {}", e);
        return;
    }

    // ロードしたモデルの推論設定を表示
    match InferenceConfig::load_from_model(Path::new(&model_path)) {
        Ok(info) => info.print_info(),
        Err(e) => eprintln!("警告: モデル情報の表示に失敗しました: {}", e),
    }

    let strokes = match load_strokes(&strokes_path) {
        Ok(strokes) => strokes,
        Err(e) => {
            eprintln!("✗ ストロークの読み込みに失敗しました: {}", e);
            return;
        }
    };
    println!("✓ {}ストロークを読み込みました", strokes.len());

    state.replay_strokes(&strokes);

    match state.predict().await {
        Ok(prediction) => {
            println!(
                "✓ 分類結果: {} ({}%)",
                prediction.label,
                prediction.confidence_percent()
            );
            println!("  ステータス: {}", state.status());

            // 明示指定されたモデルパスは設定へ引き継ぐ
            if args.len() >= 3 {
                config.set_model_path(model_path.clone());
            }
            config.update_last_sketch_path(&strokes_path);
            if let Err(e) = config.save_default() {
                eprintln!("警告: 設定の保存に失敗しました: {}", e);
            }
        }
        Err(e) => {
            eprintln!("✗ 分類に失敗しました: {}", e);
        }
    }
}
