//! Annotation data model.

mod annotation;
mod store;

pub use annotation::{Annotation, BoundingBox, Keypoint, Visibility, KEYPOINT_COUNT};
pub use store::{
    remap_index_after_insert, remap_index_after_remove, AnnotationSet, StoreError, VisibilitySet,
};
