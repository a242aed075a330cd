use crate::detection::domain::cascade_detector::{CascadeDetector, ClassifierKind, ClassifierSet};
use crate::shared::frame::GrayFrame;
use crate::shared::geometry::{FaceBox, Point};

/// Picks the one detector candidate that corresponds to the tracked
/// face, or reports that none does.
///
/// The detector has no identity continuity across frames, so proximity
/// to the carried seed is the only correlation signal. Classifiers are
/// evaluated in set order with early accept; within one classifier,
/// candidates are scanned in detector order.
pub struct CandidateSelector {
    tolerance: f64,
}

impl CandidateSelector {
    pub fn new(tolerance: f64) -> Self {
        Self { tolerance }
    }

    /// Distance of a candidate center from the seed, normalized by the
    /// seed's own coordinates: `|cx - sx| / sx + |cy - sy| / sy`.
    ///
    /// The normalizer is the seed position, not the frame size, which
    /// makes acceptance tighter near the frame origin. Kept exactly as
    /// is for output compatibility.
    fn seed_distance(center: Point, seed: Point) -> f64 {
        (center.x - seed.x).abs() / seed.x + (center.y - seed.y).abs() / seed.y
    }

    pub fn select(
        &self,
        gray: &GrayFrame,
        detector: &mut dyn CascadeDetector,
        classifiers: &ClassifierSet,
        seed: Point,
        scale: f64,
        min_neighbors: i32,
    ) -> Result<Option<FaceBox>, Box<dyn std::error::Error>> {
        for spec in classifiers.iter() {
            let candidates = detector.detect(gray, spec.name(), scale, min_neighbors)?;
            for candidate in candidates {
                let d = Self::seed_distance(candidate.center(), seed);
                if d < self.tolerance {
                    let accepted = match spec.kind() {
                        ClassifierKind::Face => candidate,
                        ClassifierKind::Eye => expand_eye_box(candidate),
                    };
                    return Ok(Some(accepted));
                }
            }
        }
        Ok(None)
    }
}

/// Grows an eye hit into an approximate face region: eyes are roughly a
/// sixth of the face across, so the box is blown up 6x about itself
/// with the eye sitting in the upper portion.
fn expand_eye_box(b: FaceBox) -> FaceBox {
    FaceBox {
        x: b.x - b.width * 3,
        y: b.y - b.height * 3,
        width: b.width * 6,
        height: b.height * 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::domain::cascade_detector::ClassifierSpec;
    use std::collections::HashMap;

    /// Scripted detector: fixed candidates per classifier name, with a
    /// record of the call order.
    struct ScriptedDetector {
        results: HashMap<String, Vec<FaceBox>>,
        calls: Vec<String>,
    }

    impl ScriptedDetector {
        fn new(results: HashMap<String, Vec<FaceBox>>) -> Self {
            Self {
                results,
                calls: Vec::new(),
            }
        }
    }

    impl CascadeDetector for ScriptedDetector {
        fn detect(
            &mut self,
            _gray: &GrayFrame,
            classifier: &str,
            _scale: f64,
            _min_neighbors: i32,
        ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
            self.calls.push(classifier.to_string());
            Ok(self.results.get(classifier).cloned().unwrap_or_default())
        }
    }

    fn gray() -> GrayFrame {
        GrayFrame::new(vec![0u8; 100 * 100], 100, 100)
    }

    fn face_only_set() -> ClassifierSet {
        ClassifierSet::new(vec![ClassifierSpec::new("face", ClassifierKind::Face)])
    }

    fn select_with(
        detector: &mut ScriptedDetector,
        set: &ClassifierSet,
        seed: Point,
    ) -> Option<FaceBox> {
        CandidateSelector::new(0.1)
            .select(&gray(), detector, set, seed, 1.05, 1)
            .unwrap()
    }

    #[test]
    fn test_accepts_candidate_centered_on_seed() {
        // box (40,40,20,20) has center (50,50); distance to seed (50,50) is 0
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "face".to_string(),
            vec![FaceBox::new(40, 40, 20, 20)],
        )]));
        let result = select_with(&mut detector, &face_only_set(), Point::new(50.0, 50.0));
        assert_eq!(result, Some(FaceBox::new(40, 40, 20, 20)));
    }

    #[test]
    fn test_rejects_candidate_outside_tolerance() {
        // center (50,50), seed (100,100): d = 50/100 + 50/100 = 1.0
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "face".to_string(),
            vec![FaceBox::new(40, 40, 20, 20)],
        )]));
        let result = select_with(&mut detector, &face_only_set(), Point::new(100.0, 100.0));
        assert_eq!(result, None);
    }

    #[test]
    fn test_distance_is_seed_normalized() {
        // Same 8px offset, different seeds: accepted far from origin,
        // rejected close to it.
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "face".to_string(),
            vec![FaceBox::new(196, 196, 16, 16)], // center (204, 204)
        )]));
        // seed (200,200): d = 4/200 + 4/200 = 0.04 < 0.1
        assert!(select_with(&mut detector, &face_only_set(), Point::new(200.0, 200.0)).is_some());

        let mut detector = ScriptedDetector::new(HashMap::from([(
            "near_origin".to_string(),
            vec![FaceBox::new(16, 16, 16, 16)], // center (24, 24)
        )]));
        let set = ClassifierSet::new(vec![ClassifierSpec::new(
            "near_origin",
            ClassifierKind::Face,
        )]);
        // seed (20,20): d = 4/20 + 4/20 = 0.4 >= 0.1
        assert!(select_with(&mut detector, &set, Point::new(20.0, 20.0)).is_none());
    }

    #[test]
    fn test_first_candidate_in_detector_order_wins() {
        // Both candidates pass; the earlier one is returned even though
        // the later one is closer to the seed.
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "face".to_string(),
            vec![FaceBox::new(38, 40, 20, 20), FaceBox::new(40, 40, 20, 20)],
        )]));
        let result = select_with(&mut detector, &face_only_set(), Point::new(50.0, 50.0));
        assert_eq!(result, Some(FaceBox::new(38, 40, 20, 20)));
    }

    #[test]
    fn test_classifier_priority_order() {
        // Both classifiers would match; the first in the set wins and
        // the second is never consulted.
        let mut detector = ScriptedDetector::new(HashMap::from([
            ("first".to_string(), vec![FaceBox::new(40, 40, 20, 20)]),
            ("second".to_string(), vec![FaceBox::new(41, 41, 20, 20)]),
        ]));
        let set = ClassifierSet::new(vec![
            ClassifierSpec::new("first", ClassifierKind::Face),
            ClassifierSpec::new("second", ClassifierKind::Face),
        ]);
        let result = select_with(&mut detector, &set, Point::new(50.0, 50.0));
        assert_eq!(result, Some(FaceBox::new(40, 40, 20, 20)));
        assert_eq!(detector.calls, vec!["first"]);
    }

    #[test]
    fn test_falls_through_to_later_classifier() {
        let mut detector = ScriptedDetector::new(HashMap::from([
            ("first".to_string(), Vec::new()),
            ("second".to_string(), vec![FaceBox::new(40, 40, 20, 20)]),
        ]));
        let set = ClassifierSet::new(vec![
            ClassifierSpec::new("first", ClassifierKind::Face),
            ClassifierSpec::new("second", ClassifierKind::Face),
        ]);
        let result = select_with(&mut detector, &set, Point::new(50.0, 50.0));
        assert_eq!(result, Some(FaceBox::new(40, 40, 20, 20)));
        assert_eq!(detector.calls, vec!["first", "second"]);
    }

    #[test]
    fn test_eye_hit_is_expanded() {
        // Eye box (10,10,5,5): center (12.5,12.5); seed matches exactly.
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "eye".to_string(),
            vec![FaceBox::new(10, 10, 5, 5)],
        )]));
        let set = ClassifierSet::new(vec![ClassifierSpec::new("eye", ClassifierKind::Eye)]);
        let result = select_with(&mut detector, &set, Point::new(12.5, 12.5));
        assert_eq!(result, Some(FaceBox::new(-5, -5, 30, 30)));
    }

    #[test]
    fn test_face_hit_is_not_expanded() {
        let mut detector = ScriptedDetector::new(HashMap::from([(
            "face".to_string(),
            vec![FaceBox::new(10, 10, 5, 5)],
        )]));
        let result = select_with(&mut detector, &face_only_set(), Point::new(12.5, 12.5));
        assert_eq!(result, Some(FaceBox::new(10, 10, 5, 5)));
    }

    #[test]
    fn test_no_candidates_returns_none() {
        let mut detector = ScriptedDetector::new(HashMap::new());
        let result = select_with(&mut detector, &face_only_set(), Point::new(50.0, 50.0));
        assert_eq!(result, None);
    }

    #[test]
    fn test_detector_error_propagates() {
        struct FailingDetector;
        impl CascadeDetector for FailingDetector {
            fn detect(
                &mut self,
                _gray: &GrayFrame,
                _classifier: &str,
                _scale: f64,
                _min_neighbors: i32,
            ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
                Err("cascade backend failure".into())
            }
        }

        let result = CandidateSelector::new(0.1).select(
            &gray(),
            &mut FailingDetector,
            &face_only_set(),
            Point::new(50.0, 50.0),
            1.05,
            1,
        );
        assert!(result.is_err());
    }
}
