use crate::shared::constants::{EYE_CASCADE, FRONTAL_FACE_CASCADE, PROFILE_FACE_CASCADE};
use crate::shared::frame::GrayFrame;
use crate::shared::geometry::FaceBox;

/// What a classifier looks for. Eye hits get expanded to a face-sized
/// region by the candidate selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassifierKind {
    Face,
    Eye,
}

/// One entry in a [`ClassifierSet`]: a cascade name plus its kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierSpec {
    name: String,
    kind: ClassifierKind,
}

impl ClassifierSpec {
    pub fn new(name: impl Into<String>, kind: ClassifierKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ClassifierKind {
        self.kind
    }
}

/// An explicitly ordered list of classifiers.
///
/// The order is part of the selection contract: the candidate selector
/// evaluates classifiers front to back and accepts the first match, so
/// higher-priority cascades must come first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassifierSet {
    specs: Vec<ClassifierSpec>,
}

impl ClassifierSet {
    pub fn new(specs: Vec<ClassifierSpec>) -> Self {
        Self { specs }
    }

    /// Frontal face, then profile face, then eyes.
    pub fn standard() -> Self {
        Self::new(vec![
            ClassifierSpec::new(FRONTAL_FACE_CASCADE, ClassifierKind::Face),
            ClassifierSpec::new(PROFILE_FACE_CASCADE, ClassifierKind::Face),
            ClassifierSpec::new(EYE_CASCADE, ClassifierKind::Eye),
        ])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifierSpec> {
        self.specs.iter()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Capability interface for cascade detection.
///
/// `detect` must be deterministic for identical inputs and must return
/// candidates in the backend's native order; the selector relies on
/// that order for tie-breaking. `&mut self` because backends keep
/// internal scan buffers.
pub trait CascadeDetector: Send {
    fn detect(
        &mut self,
        gray: &GrayFrame,
        classifier: &str,
        scale: f64,
        min_neighbors: i32,
    ) -> Result<Vec<FaceBox>, Box<dyn std::error::Error>>;
}
