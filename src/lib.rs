pub mod canvas;
pub mod classify;
pub mod decision;
pub mod preprocess;
pub mod stroke_loader;
pub mod types;

pub mod model;
#[cfg(feature = "ml")]
pub mod ml;

use std::sync::{Arc, Mutex};

use canvas::SketchCanvas;
use model::AppConfig;
use types::{status_text_for, PredictError, Prediction, Predictor, StrokePoint};

#[cfg(feature = "ml")]
use ml::InferenceEngine;
#[cfg(feature = "ml")]
use std::path::Path;

/// ロード済みモデルの有無を型で表すスロット
///
/// グローバルなnullableのモデル参照は持たず、未ロード・ロード済み・
/// ロード失敗を明示的な状態として区別する。
pub enum ModelSlot {
    /// 未ロード（起動直後、ロード完了前）
    NotLoaded,
    /// ロード完了。以降は読み取り専用で共有される
    Ready(Arc<dyn Predictor>),
    /// 起動時のロードに失敗した縮退状態
    Failed(String),
}

/// アプリケーション全体の状態
///
/// 描画面はポインタイベントで同期的に更新され、予測は非同期に走る。
/// 予測はゲートで直列化し、描画面の内容はロックを保持したまま
/// スナップショットを取ってから推論タスクへ渡す。サスペンドするのは
/// モデルロードと順伝播の2箇所だけ。
pub struct AppState {
    canvas: Arc<Mutex<SketchCanvas>>,
    model: Arc<Mutex<ModelSlot>>,
    status: Arc<Mutex<String>>, // ユーザー向けステータス1行
    prediction_gate: Arc<tokio::sync::Mutex<()>>, // 予測の直列化ガード
}

impl AppState {
    /// 指定サイズの描画面で状態を初期化
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            canvas: Arc::new(Mutex::new(SketchCanvas::new(width, height))),
            model: Arc::new(Mutex::new(ModelSlot::NotLoaded)),
            status: Arc::new(Mutex::new("model not loaded".to_string())),
            prediction_gate: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// アプリケーション設定から状態を初期化
    pub fn with_config(config: &AppConfig) -> Self {
        Self::new(config.canvas.width, config.canvas.height)
    }

    /// 現在のステータス1行を取得
    pub fn status(&self) -> String {
        self.status.lock().unwrap().clone()
    }

    /// モデルがロード済みかどうか
    pub fn is_model_ready(&self) -> bool {
        matches!(&*self.model.lock().unwrap(), ModelSlot::Ready(_))
    }

    /// 描画面の現在のラスタを複製して取得
    pub fn snapshot(&self) -> image::RgbaImage {
        self.canvas.lock().unwrap().image().clone()
    }

    /// 確定済みストロークの本数
    pub fn stroke_count(&self) -> usize {
        self.canvas.lock().unwrap().stroke_count()
    }

    /// ポインタ押下イベント
    pub fn pointer_down(&self, point: StrokePoint) {
        self.canvas.lock().unwrap().pointer_down(point);
    }

    /// ポインタ移動イベント
    pub fn pointer_move(&self, point: StrokePoint) {
        self.canvas.lock().unwrap().pointer_move(point);
    }

    /// ポインタ解放イベント
    pub fn pointer_up(&self) {
        self.canvas.lock().unwrap().pointer_up();
    }

    /// 記録済みストローク列を一括で描画する
    pub fn replay_strokes(&self, strokes: &[Vec<StrokePoint>]) {
        self.canvas.lock().unwrap().replay(strokes);
    }

    /// 描画面を白紙に戻し、ステータスを初期表示に戻す
    pub fn clear(&self) {
        self.canvas.lock().unwrap().clear();
        *self.status.lock().unwrap() = "ready".to_string();
    }

    /// ロード済みの推論エンジンを差し込む
    ///
    /// テストではスタブを、本番ではInferenceEngineを渡す。
    pub fn install_model(&self, predictor: Arc<dyn Predictor>) {
        *self.model.lock().unwrap() = ModelSlot::Ready(predictor);
        *self.status.lock().unwrap() = "model loaded - ready".to_string();
    }

    /// モデルファイルを読み込んで推論エンジンを初期化する
    ///
    /// 失敗した場合はスロットを縮退状態にする。以降の予測は
    /// LoadFailedを返し続ける（自動リトライはしない）。
    #[cfg(feature = "ml")]
    pub async fn load_model<P: AsRef<Path>>(&self, model_path: P) -> anyhow::Result<()> {
        let path = model_path.as_ref().to_path_buf();
        println!("[load_model] 開始 - パス: {}", path.display());

        let load_result = tokio::task::spawn_blocking(move || InferenceEngine::load(&path)).await;

        let result = match load_result {
            Ok(inner) => inner,
            Err(join_err) => Err(anyhow::anyhow!("model load task failed: {}", join_err)),
        };

        match result {
            Ok(engine) => {
                println!(
                    "[load_model] 完了 ({}クラス)",
                    engine.config().num_classes()
                );
                *self.model.lock().unwrap() = ModelSlot::Ready(Arc::new(engine));
                *self.status.lock().unwrap() = "model loaded - ready".to_string();
                Ok(())
            }
            Err(e) => {
                let msg = e.to_string();
                eprintln!("[load_model] 失敗: {}", msg);
                *self.model.lock().unwrap() = ModelSlot::Failed(msg.clone());
                *self.status.lock().unwrap() =
                    status_text_for(&Err(PredictError::LoadFailed(msg)));
                Err(e)
            }
        }
    }

    /// 現在の描画内容を分類する
    ///
    /// 実行中にもう一度呼ばれた場合は先行する予測の完了を待つ。
    /// 結果はステータス1行にも反映される。
    pub async fn predict(&self) -> Result<Prediction, PredictError> {
        let _gate = self.prediction_gate.lock().await;

        let result = self.predict_inner().await;
        *self.status.lock().unwrap() = status_text_for(&result);
        result
    }

    async fn predict_inner(&self) -> Result<Prediction, PredictError> {
        // モデル未ロードなら描画面に触れる前に抜ける
        let predictor = {
            let slot = self.model.lock().unwrap();
            match &*slot {
                ModelSlot::Ready(predictor) => Arc::clone(predictor),
                ModelSlot::NotLoaded => return Err(PredictError::NotReady),
                ModelSlot::Failed(msg) => return Err(PredictError::LoadFailed(msg.clone())),
            }
        };

        // await中の描画と競合しないよう、ロック中にスナップショットを取る
        let snapshot = {
            let canvas = self.canvas.lock().unwrap();
            canvas.image().clone()
        };

        let task = tokio::task::spawn_blocking(move || {
            classify::classify_surface(&snapshot, predictor.as_ref())
        });

        task.await
            .map_err(|e| PredictError::Inference(format!("prediction task failed: {}", e)))?
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(canvas::DEFAULT_SURFACE_SIZE, canvas::DEFAULT_SURFACE_SIZE)
    }
}
