//! モデル推論機能

#[cfg(feature = "ml")]
use anyhow::Result;
#[cfg(feature = "ml")]
use burn::{
    backend::NdArray,
    module::Module,
    record::{BinBytesRecorder, FullPrecisionSettings, Recorder},
    tensor::Tensor,
};
#[cfg(feature = "ml")]
use std::panic::{catch_unwind, AssertUnwindSafe};
#[cfg(feature = "ml")]
use std::path::Path;
#[cfg(feature = "ml")]
use std::sync::Mutex;

#[cfg(feature = "ml")]
use crate::ml::{ModelConfig, SketchCnn};
#[cfg(feature = "ml")]
use crate::model::{load_model_with_metadata, InferenceConfig};
#[cfg(feature = "ml")]
use crate::types::{InputTensor, PredictError, Predictor, MODEL_INPUT_SIZE};

/// 推論エンジン
///
/// モデルはパラメータの遅延初期化状態を内部に持ち、そのままでは
/// スレッド間で共有できないため、Mutex越しにアクセスする。
#[cfg(feature = "ml")]
#[derive(Debug)]
pub struct InferenceEngine {
    model: Mutex<SketchCnn<NdArray>>,
    config: InferenceConfig,
    device: burn::backend::ndarray::NdArrayDevice,
}

#[cfg(feature = "ml")]
impl InferenceEngine {
    /// モデルを読み込んで推論エンジンを初期化
    ///
    /// メタデータが前処理パイプラインと整合しない場合はエラー。
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        let (metadata, model_binary) = load_model_with_metadata(model_path.as_ref())?;
        metadata.validate()?;
        let config = InferenceConfig::from_metadata(&metadata);

        let device = Default::default();

        let model_config = ModelConfig {
            num_classes: config.num_classes(),
            dropout: 0.0, // 推論時はドロップアウトなし
            image_size: config.model_input_size as usize,
        };

        let model = model_config.init::<NdArray>(&device);

        // モデルの重みを復元。壊れたバイナリに対してデコーダは内部で
        // panicすることがあるため、ここで受け止めてエラーに変換する
        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        let record = match catch_unwind(AssertUnwindSafe(|| recorder.load(model_binary, &device)))
        {
            Ok(Ok(record)) => record,
            Ok(Err(e)) => {
                return Err(anyhow::anyhow!("Failed to load model weights: {:?}", e));
            }
            Err(_) => {
                return Err(anyhow::anyhow!(
                    "Failed to load model weights: malformed model binary"
                ));
            }
        };

        let model = model.load_record(record);

        Ok(Self {
            model: Mutex::new(model),
            config,
            device,
        })
    }

    /// InferenceConfigへの参照を取得
    pub fn config(&self) -> &InferenceConfig {
        &self.config
    }
}

#[cfg(feature = "ml")]
impl Predictor for InferenceEngine {
    /// 順伝播を1回実行して確率ベクトルを返す
    ///
    /// 入力テンソルを消費するため、推論後に値が残ることはない。
    fn predict(&self, input: InputTensor) -> Result<Vec<f32>, PredictError> {
        let size = MODEL_INPUT_SIZE;

        // (1, 28, 28, 1) はチャンネル数が1なので、要素順を変えずに
        // (1, 1, 28, 28) として読み替えられる
        let values = input.into_values();
        let tensor = Tensor::<NdArray, 1>::from_floats(values.as_slice(), &self.device)
            .reshape([1, 1, size, size]);

        let logits = self.model.lock().unwrap().forward(tensor);
        let probabilities = burn::tensor::activation::softmax(logits, 1);

        probabilities.into_data().to_vec::<f32>().map_err(|e| {
            PredictError::Inference(format!("failed to read output tensor: {:?}", e))
        })
    }

    fn class_labels(&self) -> &[String] {
        &self.config.class_labels
    }
}

#[cfg(all(test, feature = "ml"))]
mod tests {
    use super::*;
    use crate::model::{save_model_with_metadata, ModelMetadata};
    use crate::types::NUM_CLASSES;

    /// 初期化直後のモデル重みをバイナリ化する
    fn fresh_model_binary() -> Vec<u8> {
        let device = Default::default();
        let config = ModelConfig {
            num_classes: NUM_CLASSES,
            dropout: 0.0,
            image_size: MODEL_INPUT_SIZE,
        };
        let model = config.init::<NdArray>(&device);

        let recorder = BinBytesRecorder::<FullPrecisionSettings>::default();
        recorder.record(model.into_record(), ()).unwrap()
    }

    fn save_test_artifact(name: &str, metadata: &ModelMetadata, binary: &[u8]) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        save_model_with_metadata(&path, metadata, binary).unwrap();
        path
    }

    fn blank_tensor() -> InputTensor {
        InputTensor::from_values(vec![0.0; MODEL_INPUT_SIZE * MODEL_INPUT_SIZE]).unwrap()
    }

    #[test]
    fn test_load_and_predict_round_trip() {
        let metadata = ModelMetadata::with_default_labels(0);
        let path = save_test_artifact(
            "sketch_classifier_test_engine.tar.gz",
            &metadata,
            &fresh_model_binary(),
        );

        let engine = InferenceEngine::load(&path).unwrap();
        assert_eq!(engine.class_labels().len(), 8);

        let probabilities = engine.predict(blank_tensor()).unwrap();
        assert_eq!(probabilities.len(), 8);

        // softmax後の確率分布になっている
        let sum: f32 = probabilities.iter().sum();
        assert!((sum - 1.0).abs() < 1e-4, "確率の合計が1でない: {}", sum);
        assert!(probabilities.iter().all(|&p| (0.0..=1.0).contains(&p)));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_predict_is_deterministic() {
        let metadata = ModelMetadata::with_default_labels(0);
        let path = save_test_artifact(
            "sketch_classifier_test_engine_det.tar.gz",
            &metadata,
            &fresh_model_binary(),
        );

        let engine = InferenceEngine::load(&path).unwrap();
        let first = engine.predict(blank_tensor()).unwrap();
        let second = engine.predict(blank_tensor()).unwrap();
        assert_eq!(first, second);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_predict_from_another_thread() {
        use std::sync::Arc;

        let metadata = ModelMetadata::with_default_labels(0);
        let path = save_test_artifact(
            "sketch_classifier_test_engine_thread.tar.gz",
            &metadata,
            &fresh_model_binary(),
        );

        // AppStateと同じく Arc<dyn Predictor> として共有し、
        // 別スレッドからの推論が通ることを確認する
        let engine: Arc<dyn Predictor> = Arc::new(InferenceEngine::load(&path).unwrap());

        let handle = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.predict(blank_tensor()))
        };
        let from_thread = handle.join().unwrap().unwrap();
        let from_main = engine.predict(blank_tensor()).unwrap();
        assert_eq!(from_thread, from_main);

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_corrupt_weights() {
        let metadata = ModelMetadata::with_default_labels(0);
        let path = save_test_artifact(
            "sketch_classifier_test_engine_corrupt.tar.gz",
            &metadata,
            &[1, 2, 3, 4],
        );

        let err = InferenceEngine::load(&path).unwrap_err();
        assert!(err.to_string().contains("model weights"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_truncated_weights() {
        let metadata = ModelMetadata::with_default_labels(0);
        let mut binary = fresh_model_binary();
        binary.truncate(binary.len() / 2);
        let path = save_test_artifact(
            "sketch_classifier_test_engine_truncated.tar.gz",
            &metadata,
            &binary,
        );

        let err = InferenceEngine::load(&path).unwrap_err();
        assert!(err.to_string().contains("model weights"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_rejects_mismatched_metadata() {
        let mut metadata = ModelMetadata::with_default_labels(0);
        metadata.model_input_size = 48;
        let path = save_test_artifact(
            "sketch_classifier_test_engine_badmeta.tar.gz",
            &metadata,
            &fresh_model_binary(),
        );

        assert!(InferenceEngine::load(&path).is_err());

        std::fs::remove_file(&path).ok();
    }
}
