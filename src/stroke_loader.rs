use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::types::StrokePoint;

/// ストローク記録ファイル（JSON）を読み込む
///
/// 形式はストロークの配列で、各ストロークは [x, y] ペアの配列。
/// 例: `[[[70, 124], [83, 141]], [[157, 89], [201, 92]]]`
pub fn load_strokes(path: &Path) -> Result<Vec<Vec<StrokePoint>>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read stroke file: {}", path.display()))?;
    parse_strokes(&text)
}

/// JSON文字列からストローク列を取り出す
pub fn parse_strokes(text: &str) -> Result<Vec<Vec<StrokePoint>>> {
    let raw: Vec<Vec<[f32; 2]>> =
        serde_json::from_str(text).context("Failed to parse stroke JSON")?;

    let strokes = raw
        .into_iter()
        .map(|stroke| {
            stroke
                .into_iter()
                .map(|[x, y]| StrokePoint::new(x, y))
                .collect()
        })
        .collect();

    Ok(strokes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_strokes() {
        let text = "[[[70, 124], [83, 141], [111, 148]], [[157, 89], [201, 92]]]";
        let strokes = parse_strokes(text).unwrap();
        assert_eq!(strokes.len(), 2);
        assert_eq!(strokes[0].len(), 3);
        assert_eq!(strokes[0][0], StrokePoint::new(70.0, 124.0));
        assert_eq!(strokes[1][1], StrokePoint::new(201.0, 92.0));
    }

    #[test]
    fn test_parse_empty_sketch() {
        let strokes = parse_strokes("[]").unwrap();
        assert!(strokes.is_empty());
    }

    #[test]
    fn test_parse_rejects_invalid_json() {
        assert!(parse_strokes("not json").is_err());
        assert!(parse_strokes("[[[1, 2, 3]]]").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join("sketch_classifier_test_strokes.json");
        fs::write(&path, "[[[10.5, 20.5], [30.0, 40.0]]]").unwrap();

        let strokes = load_strokes(&path).unwrap();
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0][0], StrokePoint::new(10.5, 20.5));

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let path = Path::new("/nonexistent/strokes.json");
        let err = load_strokes(path).unwrap_err();
        assert!(err.to_string().contains("strokes.json"));
    }
}
