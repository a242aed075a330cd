use std::collections::HashMap;
use std::path::Path;

use opencv::core::{Mat, Rect, Size, Vector};
use opencv::objdetect::CascadeClassifier;
use opencv::prelude::*;

use crate::detection::domain::cascade_detector::{CascadeDetector, ClassifierSet};
use crate::detection::infrastructure::cascade_resolver;
use crate::shared::frame::GrayFrame;
use crate::shared::geometry::FaceBox;

/// Cascade detection backed by OpenCV's `CascadeClassifier`.
///
/// All cascades named in the [`ClassifierSet`] are loaded up front, one
/// classifier instance per entry, and the set is fixed for the lifetime
/// of the detector. Detection itself needs `&mut` because OpenCV keeps
/// scan state inside the classifier object.
pub struct OpencvCascadeDetector {
    classifiers: HashMap<String, CascadeClassifier>,
}

impl OpencvCascadeDetector {
    /// Loads every cascade in `set`, resolving XML files through
    /// [`cascade_resolver`] (explicit dir, cache, then download).
    pub fn new(
        set: &ClassifierSet,
        cascade_dir: Option<&Path>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let mut classifiers = HashMap::new();
        for spec in set.iter() {
            let path = cascade_resolver::resolve(spec.name(), cascade_dir)?;
            let path_str = path
                .to_str()
                .ok_or_else(|| format!("cascade path is not valid UTF-8: {}", path.display()))?;
            let classifier = CascadeClassifier::new(path_str)?;
            if classifier.empty()? {
                return Err(format!("cascade failed to load: {}", path.display()).into());
            }
            classifiers.insert(spec.name().to_string(), classifier);
        }
        Ok(Self { classifiers })
    }
}

// Safety: the classifier map is only touched through &mut self; OpenCV
// objects are not shared across threads.
unsafe impl Send for OpencvCascadeDetector {}

impl CascadeDetector for OpencvCascadeDetector {
    fn detect(
        &mut self,
        gray: &GrayFrame,
        classifier: &str,
        scale: f64,
        min_neighbors: i32,
    ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>> {
        let cc = self
            .classifiers
            .get_mut(classifier)
            .ok_or_else(|| format!("classifier not loaded: {classifier}"))?;

        let mat = Mat::new_rows_cols_with_data(
            gray.height() as i32,
            gray.width() as i32,
            gray.data(),
        )?;

        let mut hits = Vector::<Rect>::new();
        cc.detect_multi_scale(
            &mat,
            &mut hits,
            scale,
            min_neighbors,
            0,
            Size::default(),
            Size::default(),
        )?;

        Ok(hits
            .iter()
            .map(|r| FaceBox::new(r.x, r.y, r.width, r.height))
            .collect())
    }
}
