use image::{Rgba, RgbaImage};

use crate::types::{DrawState, StrokePoint};

/// 描画面の既定サイズ（ピクセル）
pub const DEFAULT_SURFACE_SIZE: u32 = 280;

/// インクの線幅（ピクセル）
const STROKE_WIDTH: f32 = 6.0;

const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// ストローク中に確定した描画区間
///
/// トラッカが move 遷移のたびに発行し、ラスタ側がこれを塗る。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: StrokePoint,
    pub to: StrokePoint,
}

/// ポインタイベント駆動のストローク記録器
///
/// Idle → Drawing → Idle の状態機械として動き、ストロークの座標列を
/// 記録する。ラスタには触れず、move のたびに塗るべき区間を `Segment`
/// として返すだけなので、描画面なしで単体検証できる。
#[derive(Debug)]
pub struct StrokeTracker {
    strokes: Vec<Vec<StrokePoint>>,
    state: DrawState,
}

impl StrokeTracker {
    pub fn new() -> Self {
        Self {
            strokes: Vec::new(),
            state: DrawState::Idle,
        }
    }

    pub fn state(&self) -> DrawState {
        self.state
    }

    /// 確定済みストロークと記録中ストロークの合計本数
    pub fn stroke_count(&self) -> usize {
        self.strokes.len()
    }

    /// 何も描かれていなければ true
    ///
    /// 点が1つだけのストロークは区間を発行しないため空とみなす。
    pub fn is_blank(&self) -> bool {
        self.strokes.iter().all(|s| s.len() < 2)
    }

    /// ポインタ押下。新しいストロークを開始する
    ///
    /// 押下しただけでは区間は発行されない（最初の move で引かれる）。
    /// すでに描画中の場合は無視する。
    pub fn pointer_down(&mut self, point: StrokePoint) {
        if self.state == DrawState::Drawing {
            return;
        }
        self.strokes.push(vec![point]);
        self.state = DrawState::Drawing;
    }

    /// ポインタ移動。描画中なら直前の点からの区間を発行する
    ///
    /// 描画中でなければ何もしない（ポインタが離れた後の移動は捨てる）。
    pub fn pointer_move(&mut self, point: StrokePoint) -> Option<Segment> {
        if self.state != DrawState::Drawing {
            return None;
        }
        let current = self.strokes.last_mut()?;
        let from = *current.last().unwrap_or(&point);
        current.push(point);
        Some(Segment { from, to: point })
    }

    /// ポインタ解放。現在のストロークを確定する
    pub fn pointer_up(&mut self) {
        self.state = DrawState::Idle;
    }

    /// ストローク履歴を捨てて Idle に戻す
    pub fn clear(&mut self) {
        self.strokes.clear();
        self.state = DrawState::Idle;
    }
}

impl Default for StrokeTracker {
    fn default() -> Self {
        Self::new()
    }
}

/// 手描きスケッチの描画面
///
/// `StrokeTracker` が発行する区間を購読し、白背景のラスタへ黒インクの
/// 太線として描き込む。座標は描画面ローカル（左上原点、ピクセル単位）
/// を前提とする。
pub struct SketchCanvas {
    image: RgbaImage,
    tracker: StrokeTracker,
}

impl SketchCanvas {
    /// 指定サイズの白紙キャンバスを作成
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, BACKGROUND),
            tracker: StrokeTracker::new(),
        }
    }

    /// 既定サイズ（280x280）の白紙キャンバスを作成
    pub fn with_default_size() -> Self {
        Self::new(DEFAULT_SURFACE_SIZE, DEFAULT_SURFACE_SIZE)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn state(&self) -> DrawState {
        self.tracker.state()
    }

    pub fn stroke_count(&self) -> usize {
        self.tracker.stroke_count()
    }

    pub fn is_blank(&self) -> bool {
        self.tracker.is_blank()
    }

    /// ラスタバッファへの参照（リサンプラが読み取る）
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// ポインタ押下。新しいストロークを開始する
    ///
    /// 押下しただけでは描画されない（最初の move で線分が引かれる）。
    pub fn pointer_down(&mut self, point: StrokePoint) {
        self.tracker.pointer_down(point);
    }

    /// ポインタ移動。描画中なら直前の点から線分を描き足す
    pub fn pointer_move(&mut self, point: StrokePoint) {
        if let Some(segment) = self.tracker.pointer_move(point) {
            self.paint_segment(segment);
        }
    }

    /// ポインタ解放。現在のストロークを確定する
    ///
    /// 描画面の外で指を離した場合も同じ扱いで、ストロークはそこで終わる。
    pub fn pointer_up(&mut self) {
        self.tracker.pointer_up();
    }

    /// 全消去。ラスタを白紙に戻し、ストローク履歴も捨てる
    pub fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = BACKGROUND;
        }
        self.tracker.clear();
    }

    /// 記録済みストローク列を一括で描画する
    ///
    /// ファイルから読み込んだスケッチの再生に使う。手描きと同じ
    /// down / move / up の列に展開するため、結果のラスタは
    /// 同じ座標列を手で描いた場合と一致する。
    pub fn replay(&mut self, strokes: &[Vec<StrokePoint>]) {
        for stroke in strokes {
            let mut points = stroke.iter();
            if let Some(first) = points.next() {
                self.pointer_down(*first);
                for point in points {
                    self.pointer_move(*point);
                }
                self.pointer_up();
            }
        }
    }

    /// 2点間をつなぐ太さ6の線分（端は丸め）を描き込む
    ///
    /// 線分からの距離が半径以下のピクセルを塗る。距離が半径の
    /// 境界にかかるピクセルは被覆率で背景と混合し、縁を滑らかにする。
    fn paint_segment(&mut self, segment: Segment) {
        // 空のラスタには塗れない
        if self.image.width() == 0 || self.image.height() == 0 {
            return;
        }

        let Segment { from, to } = segment;
        let radius = STROKE_WIDTH / 2.0;

        let min_x = (from.x.min(to.x) - radius - 1.0).floor().max(0.0) as u32;
        let min_y = (from.y.min(to.y) - radius - 1.0).floor().max(0.0) as u32;
        let max_x = (from.x.max(to.x) + radius + 1.0).ceil() as u32;
        let max_y = (from.y.max(to.y) + radius + 1.0).ceil() as u32;
        let max_x = max_x.min(self.image.width().saturating_sub(1));
        let max_y = max_y.min(self.image.height().saturating_sub(1));

        for py in min_y..=max_y {
            for px in min_x..=max_x {
                let dist = distance_to_segment(
                    px as f32 + 0.5,
                    py as f32 + 0.5,
                    from,
                    to,
                );
                let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
                if coverage <= 0.0 {
                    continue;
                }
                let pixel = self.image.get_pixel_mut(px, py);
                for c in 0..4 {
                    let old = pixel.0[c] as f32;
                    let target = INK.0[c] as f32;
                    pixel.0[c] = (old + (target - old) * coverage).round() as u8;
                }
            }
        }
    }
}

/// 点 (px, py) から線分 from-to までの最短距離
fn distance_to_segment(px: f32, py: f32, from: StrokePoint, to: StrokePoint) -> f32 {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let length_sq = dx * dx + dy * dy;

    // 線分が1点に退化している場合は点との距離
    if length_sq <= f32::EPSILON {
        let ex = px - from.x;
        let ey = py - from.y;
        return (ex * ex + ey * ey).sqrt();
    }

    let t = (((px - from.x) * dx + (py - from.y) * dy) / length_sq).clamp(0.0, 1.0);
    let cx = from.x + t * dx;
    let cy = from.y + t * dy;
    let ex = px - cx;
    let ey = py - cy;
    (ex * ex + ey * ey).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_all_white(canvas: &SketchCanvas) -> bool {
        canvas.image().pixels().all(|p| p.0 == [255, 255, 255, 255])
    }

    #[test]
    fn test_tracker_emits_segments_in_order() {
        let mut tracker = StrokeTracker::new();
        tracker.pointer_down(StrokePoint::new(10.0, 10.0));

        let first = tracker.pointer_move(StrokePoint::new(20.0, 20.0));
        assert_eq!(
            first,
            Some(Segment {
                from: StrokePoint::new(10.0, 10.0),
                to: StrokePoint::new(20.0, 20.0),
            })
        );

        let second = tracker.pointer_move(StrokePoint::new(30.0, 20.0));
        assert_eq!(
            second,
            Some(Segment {
                from: StrokePoint::new(20.0, 20.0),
                to: StrokePoint::new(30.0, 20.0),
            })
        );
    }

    #[test]
    fn test_tracker_ignores_moves_while_idle() {
        let mut tracker = StrokeTracker::new();
        assert_eq!(tracker.pointer_move(StrokePoint::new(50.0, 50.0)), None);
        assert_eq!(tracker.stroke_count(), 0);

        tracker.pointer_down(StrokePoint::new(10.0, 10.0));
        tracker.pointer_up();
        assert_eq!(tracker.pointer_move(StrokePoint::new(50.0, 50.0)), None);
        assert_eq!(tracker.stroke_count(), 1);
    }

    #[test]
    fn test_tracker_clear_returns_to_idle() {
        let mut tracker = StrokeTracker::new();
        tracker.pointer_down(StrokePoint::new(10.0, 10.0));
        tracker.pointer_move(StrokePoint::new(20.0, 20.0));

        tracker.clear();
        assert_eq!(tracker.state(), DrawState::Idle);
        assert_eq!(tracker.stroke_count(), 0);
        assert!(tracker.is_blank());
    }

    #[test]
    fn test_new_canvas_is_white() {
        let canvas = SketchCanvas::new(280, 280);
        assert!(is_all_white(&canvas));
        assert_eq!(canvas.state(), DrawState::Idle);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_state_transitions() {
        let mut canvas = SketchCanvas::with_default_size();
        assert_eq!(canvas.state(), DrawState::Idle);

        canvas.pointer_down(StrokePoint::new(10.0, 10.0));
        assert_eq!(canvas.state(), DrawState::Drawing);

        canvas.pointer_move(StrokePoint::new(20.0, 20.0));
        assert_eq!(canvas.state(), DrawState::Drawing);

        canvas.pointer_up();
        assert_eq!(canvas.state(), DrawState::Idle);
    }

    #[test]
    fn test_move_without_down_is_ignored() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_move(StrokePoint::new(50.0, 50.0));
        canvas.pointer_move(StrokePoint::new(100.0, 100.0));
        assert!(is_all_white(&canvas));
        assert_eq!(canvas.stroke_count(), 0);
    }

    #[test]
    fn test_click_without_move_leaves_no_ink() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_down(StrokePoint::new(140.0, 140.0));
        canvas.pointer_up();
        assert!(is_all_white(&canvas));
        assert_eq!(canvas.stroke_count(), 1);
        assert!(canvas.is_blank());
    }

    #[test]
    fn test_segment_paints_ink() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_down(StrokePoint::new(40.0, 140.0));
        canvas.pointer_move(StrokePoint::new(240.0, 140.0));
        canvas.pointer_up();

        // 線分の中央は完全な黒になる
        let center = canvas.image().get_pixel(140, 140);
        assert_eq!(center.0, [0, 0, 0, 255]);
        // 線分から十分離れた場所は白のまま
        let far = canvas.image().get_pixel(140, 40);
        assert_eq!(far.0, [255, 255, 255, 255]);
        assert!(!canvas.is_blank());
    }

    #[test]
    fn test_moves_after_up_do_not_paint() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_down(StrokePoint::new(40.0, 40.0));
        canvas.pointer_move(StrokePoint::new(80.0, 40.0));
        canvas.pointer_up();

        let before: Vec<u8> = canvas.image().as_raw().clone();
        canvas.pointer_move(StrokePoint::new(200.0, 200.0));
        assert_eq!(canvas.image().as_raw(), &before);
        assert_eq!(canvas.stroke_count(), 1);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_down(StrokePoint::new(40.0, 40.0));
        canvas.pointer_move(StrokePoint::new(200.0, 200.0));
        canvas.pointer_up();
        assert!(!is_all_white(&canvas));

        canvas.clear();
        assert!(is_all_white(&canvas));
        assert_eq!(canvas.stroke_count(), 0);
        assert_eq!(canvas.state(), DrawState::Idle);
    }

    #[test]
    fn test_replay_matches_manual_drawing() {
        let strokes = vec![
            vec![
                StrokePoint::new(40.0, 40.0),
                StrokePoint::new(120.0, 80.0),
                StrokePoint::new(200.0, 40.0),
            ],
            vec![StrokePoint::new(60.0, 200.0), StrokePoint::new(220.0, 200.0)],
        ];

        let mut manual = SketchCanvas::with_default_size();
        for stroke in &strokes {
            manual.pointer_down(stroke[0]);
            for point in &stroke[1..] {
                manual.pointer_move(*point);
            }
            manual.pointer_up();
        }

        let mut replayed = SketchCanvas::with_default_size();
        replayed.replay(&strokes);

        assert_eq!(manual.image().as_raw(), replayed.image().as_raw());
        assert_eq!(replayed.stroke_count(), 2);
    }

    #[test]
    fn test_zero_width_canvas_ignores_strokes() {
        // 手編集された設定のサイズ0を模したケース
        let mut canvas = SketchCanvas::new(0, 280);
        canvas.pointer_down(StrokePoint::new(0.0, 0.0));
        canvas.pointer_move(StrokePoint::new(3.0, 3.0));
        canvas.pointer_up();

        assert_eq!(canvas.stroke_count(), 1);
        assert_eq!(canvas.image().width(), 0);
    }

    #[test]
    fn test_zero_size_canvas_ignores_strokes() {
        let mut canvas = SketchCanvas::new(0, 0);
        canvas.pointer_down(StrokePoint::new(5.0, 5.0));
        canvas.pointer_move(StrokePoint::new(10.0, 10.0));
        canvas.pointer_up();

        assert_eq!(canvas.stroke_count(), 1);
    }

    #[test]
    fn test_down_while_drawing_is_ignored() {
        let mut canvas = SketchCanvas::with_default_size();
        canvas.pointer_down(StrokePoint::new(10.0, 10.0));
        canvas.pointer_down(StrokePoint::new(100.0, 100.0));
        assert_eq!(canvas.stroke_count(), 1);
    }
}
