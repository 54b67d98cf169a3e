//! Ordered annotation storage and the display-visibility subset.
//!
//! Order is significant: it fixes the sidecar line order, and positions in
//! the sequence are the only identity annotations have. Removing an entry
//! shifts every higher index down by one, so holders of stored indices must
//! remap them with the helpers here.

use std::collections::HashSet;

use thiserror::Error;

use crate::model::annotation::{Annotation, BoundingBox, Keypoint, Visibility};

/// Error returned by index-based store operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// Annotation index past the end of the set.
    #[error("annotation index {index} out of range (set holds {len})")]
    AnnotationOutOfRange { index: usize, len: usize },

    /// Keypoint slot index past the fixed slot count.
    #[error("keypoint slot {slot} out of range")]
    KeypointOutOfRange { slot: usize },
}

/// The ordered annotations of the current image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationSet {
    annotations: Vec<Annotation>,
}

impl AnnotationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an already-loaded list (persistence path).
    pub fn from_vec(annotations: Vec<Annotation>) -> Self {
        Self { annotations }
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Annotation> {
        self.annotations.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Append a new bounding box annotation with all keypoint slots absent.
    /// Returns its index.
    pub fn add_bounding_box(&mut self, class_id: usize, bbox: BoundingBox) -> usize {
        self.annotations.push(Annotation::new(class_id, bbox));
        let index = self.annotations.len() - 1;
        log::debug!("added annotation {} (class {})", index, class_id);
        index
    }

    /// Overwrite a keypoint slot, returning its previous value.
    pub fn set_keypoint(
        &mut self,
        annotation: usize,
        slot: usize,
        keypoint: Keypoint,
    ) -> Result<Keypoint, StoreError> {
        let ann = self.get_mut(annotation)?;
        let previous = *ann
            .keypoints
            .get(slot)
            .ok_or(StoreError::KeypointOutOfRange { slot })?;
        ann.keypoints[slot] = keypoint;
        Ok(previous)
    }

    /// Change only the visibility flag of a keypoint slot, keeping its
    /// position. Returns the previous flag.
    pub fn set_keypoint_visibility(
        &mut self,
        annotation: usize,
        slot: usize,
        visibility: Visibility,
    ) -> Result<Visibility, StoreError> {
        let ann = self.get_mut(annotation)?;
        let kp = ann
            .keypoints
            .get_mut(slot)
            .ok_or(StoreError::KeypointOutOfRange { slot })?;
        let previous = kp.visibility;
        kp.visibility = visibility;
        Ok(previous)
    }

    /// Clear a keypoint slot back to `(0, 0, absent)`, returning the previous
    /// triple. "Removal" never shrinks the slot array.
    pub fn clear_keypoint(&mut self, annotation: usize, slot: usize) -> Result<Keypoint, StoreError> {
        self.set_keypoint(annotation, slot, Keypoint::default())
    }

    /// Change an annotation's class, returning the previous class id.
    pub fn set_class(&mut self, annotation: usize, class_id: usize) -> Result<usize, StoreError> {
        let ann = self.get_mut(annotation)?;
        let previous = ann.class_id;
        ann.class_id = class_id;
        Ok(previous)
    }

    /// Remove the annotation at `index`, returning it. Every index greater
    /// than `index` shifts down by one; see [`VisibilitySet::remap_after_remove`].
    pub fn remove(&mut self, index: usize) -> Result<Annotation, StoreError> {
        if index >= self.annotations.len() {
            return Err(StoreError::AnnotationOutOfRange {
                index,
                len: self.annotations.len(),
            });
        }
        let removed = self.annotations.remove(index);
        log::debug!("removed annotation {}", index);
        Ok(removed)
    }

    /// Re-insert an annotation at `index` (undo path). Position matters:
    /// references recorded before the matching removal stay correct only if
    /// the snapshot returns to the exact position it was removed from.
    pub fn insert(&mut self, index: usize, annotation: Annotation) {
        let index = index.min(self.annotations.len());
        self.annotations.insert(index, annotation);
    }

    /// Index of the first annotation (in set order) whose box contains the
    /// normalized point.
    pub fn hit_test(&self, nx: f32, ny: f32) -> Option<usize> {
        self.annotations
            .iter()
            .position(|ann| ann.bbox.contains_norm(nx, ny))
    }

    fn get_mut(&mut self, index: usize) -> Result<&mut Annotation, StoreError> {
        let len = self.annotations.len();
        self.annotations
            .get_mut(index)
            .ok_or(StoreError::AnnotationOutOfRange { index, len })
    }
}

/// Remap a stored annotation index after the entry at `removed` was deleted:
/// references to it clear, references above it shift down.
pub fn remap_index_after_remove(index: Option<usize>, removed: usize) -> Option<usize> {
    match index {
        Some(i) if i == removed => None,
        Some(i) if i > removed => Some(i - 1),
        other => other,
    }
}

/// Remap a stored annotation index after an entry was re-inserted at
/// `inserted`: references at or above it shift up.
pub fn remap_index_after_insert(index: Option<usize>, inserted: usize) -> Option<usize> {
    match index {
        Some(i) if i >= inserted => Some(i + 1),
        other => other,
    }
}

/// Indices of annotations currently rendered. A display-layer subset of the
/// annotation set; never persisted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisibilitySet {
    visible: HashSet<usize>,
}

impl VisibilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// All of `0..len` visible (the state after loading an image).
    pub fn all(len: usize) -> Self {
        Self {
            visible: (0..len).collect(),
        }
    }

    pub fn insert(&mut self, index: usize) {
        self.visible.insert(index);
    }

    pub fn set(&mut self, index: usize, visible: bool) {
        if visible {
            self.visible.insert(index);
        } else {
            self.visible.remove(&index);
        }
    }

    pub fn contains(&self, index: usize) -> bool {
        self.visible.contains(&index)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }

    pub fn clear(&mut self) {
        self.visible.clear();
    }

    /// Apply the index shift caused by removing the annotation at `removed`.
    pub fn remap_after_remove(&mut self, removed: usize) {
        self.visible = self
            .visible
            .iter()
            .filter(|&&i| i != removed)
            .map(|&i| if i > removed { i - 1 } else { i })
            .collect();
    }

    /// Apply the index shift caused by re-inserting an annotation at
    /// `inserted`, and mark the restored entry visible.
    pub fn remap_after_insert(&mut self, inserted: usize) {
        self.visible = self
            .visible
            .iter()
            .map(|&i| if i >= inserted { i + 1 } else { i })
            .collect();
        self.visible.insert(inserted);
    }
}
