//! 機械学習モデルの共通定義
//!
//! 手描きスケッチ分類用のCNNモデルと関連する設定を提供します。

#[cfg(feature = "ml")]
use burn::{
    config::Config,
    module::Module,
    nn::{
        conv::{Conv2d, Conv2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
        Linear, LinearConfig, Relu,
    },
    tensor::{backend::Backend, Tensor},
};

/// モデル設定
#[cfg(feature = "ml")]
#[derive(Config, Debug)]
pub struct ModelConfig {
    /// 分類クラス数
    pub num_classes: usize,
    /// ドロップアウト率
    #[config(default = 0.5)]
    pub dropout: f64,
    /// 入力画像サイズ（正方形）
    #[config(default = 28)]
    pub image_size: usize,
}

#[cfg(feature = "ml")]
impl ModelConfig {
    /// モデルを初期化
    pub fn init<B: Backend>(&self, device: &B::Device) -> SketchCnn<B> {
        // サイズ計算:
        // Conv1 (3x3, no padding): size -> size - 2
        // Pool1 (2x2): (size - 2) -> (size - 2) / 2  (切り捨て)
        // Conv2 (3x3, no padding): ((size - 2) / 2) -> ((size - 2) / 2) - 2
        // Pool2 (2x2): (((size - 2) / 2) - 2) -> (((size - 2) / 2) - 2) / 2

        let after_conv1 = self.image_size.saturating_sub(2);
        let after_pool1 = after_conv1 / 2;
        let after_conv2 = after_pool1.saturating_sub(2);
        let after_pool2 = after_conv2 / 2;

        if after_pool2 == 0 {
            panic!(
                "入力サイズが小さすぎます: {} (最小10x10が必要)",
                self.image_size
            );
        }

        // 特徴次元 d = 64チャネル * after_pool2 * after_pool2
        let d = 64 * after_pool2 * after_pool2;
        let d_half = d / 2;

        println!("[Model] 入力サイズ: {}x{}", self.image_size, self.image_size);
        println!("[Model] Conv1後: {}x{}", after_conv1, after_conv1);
        println!("[Model] Pool1後: {}x{}", after_pool1, after_pool1);
        println!("[Model] Conv2後: {}x{}", after_conv2, after_conv2);
        println!("[Model] Pool2後: 64 x {}x{}", after_pool2, after_pool2);
        println!("[Model] Flatten後の特徴次元 d: {}", d);
        println!("[Model] FC1: {} -> {}", d, d_half);
        println!("[Model] FC2: {} -> {}", d_half, self.num_classes);

        SketchCnn {
            // Conv1: 3x3 (no padding, stride 1)
            conv1: Conv2dConfig::new([1, 32], [3, 3])
                .with_stride([1, 1])
                .init(device),
            pool1: MaxPool2dConfig::new([2, 2]).init(),

            // Conv2: 3x3 (no padding, stride 1)
            conv2: Conv2dConfig::new([32, 64], [3, 3])
                .with_stride([1, 1])
                .init(device),
            pool2: MaxPool2dConfig::new([2, 2]).init(),

            // 全結合層
            fc1: LinearConfig::new(d, d_half).init(device),
            fc2: LinearConfig::new(d_half, self.num_classes).init(device),

            activation: Relu::new(),
        }
    }
}

/// スケッチ分類用CNNモデル
///
/// グレースケール1チャンネルの正方形画像を任意のクラス数に分類します。
///
/// # アーキテクチャ
/// - {Conv 3x3 (no padding, stride 1) + ReLU + MaxPool 2x2} x 2層
/// - Flatten
/// - FC: d -> d/2 + ReLU
/// - FC: d/2 -> num_classes
/// - Softmax (分類時に呼び出し側で適用)
///
/// # サイズ計算（入力28x28の場合）
/// - Conv1後: 26x26、Pool1後: 13x13
/// - Conv2後: 11x11、Pool2後: 5x5
/// - 特徴次元 d = 64 * 5 * 5 = 1600
#[cfg(feature = "ml")]
#[derive(Module, Debug)]
pub struct SketchCnn<B: Backend> {
    // 3x3 Conv (no padding) + Max Pooling
    conv1: Conv2d<B>, // 1 -> 32
    pool1: MaxPool2d, // 2x2
    conv2: Conv2d<B>, // 32 -> 64
    pool2: MaxPool2d, // 2x2

    // 全結合層
    fc1: Linear<B>, // d -> d/2
    fc2: Linear<B>, // d/2 -> num_classes

    activation: Relu,
}

#[cfg(feature = "ml")]
impl<B: Backend> SketchCnn<B> {
    /// 順伝播
    ///
    /// # 引数
    /// - `images`: バッチ画像 [batch_size, 1, size, size]
    ///
    /// # 戻り値
    /// - クラスごとのロジット [batch_size, num_classes]
    pub fn forward(&self, images: Tensor<B, 4>) -> Tensor<B, 2> {
        let [batch_size, _, _, _] = images.dims();

        // Conv1: 3x3 (no padding) + ReLU + Pool
        let x = self.conv1.forward(images);
        let x = self.activation.forward(x);
        let x = self.pool1.forward(x);

        // Conv2: 3x3 (no padding) + ReLU + Pool
        let x = self.conv2.forward(x);
        let x = self.activation.forward(x);
        let x = self.pool2.forward(x);

        // Flatten
        let [_, c, h, w] = x.dims();
        let x = x.reshape([batch_size, c * h * w]);

        // FC1: d -> d/2 + ReLU
        let x = self.fc1.forward(x);
        let x = self.activation.forward(x);

        // FC2: d/2 -> num_classes
        self.fc2.forward(x)
    }
}
