//! Core annotation data types.

/// Number of keypoint slots every annotation carries.
///
/// The on-disk format always holds exactly this many triples per line; the
/// fixed-size array keeps the invariant structural in memory as well.
pub const KEYPOINT_COUNT: usize = 9;

/// Keypoint visibility flag, matching the integer stored in the label file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Slot not placed.
    #[default]
    Absent,
    /// Placed but occluded.
    Occluded,
    /// Placed and visible.
    Visible,
}

impl Visibility {
    /// Parse the on-disk flag value.
    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Visibility::Absent),
            1 => Some(Visibility::Occluded),
            2 => Some(Visibility::Visible),
            _ => None,
        }
    }

    /// The on-disk flag value.
    pub fn as_u8(self) -> u8 {
        match self {
            Visibility::Absent => 0,
            Visibility::Occluded => 1,
            Visibility::Visible => 2,
        }
    }

    /// Whether the slot holds a placed keypoint.
    pub fn is_set(self) -> bool {
        !matches!(self, Visibility::Absent)
    }
}

/// One keypoint slot: normalized position plus visibility.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Keypoint {
    pub x: f32,
    pub y: f32,
    pub visibility: Visibility,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, visibility: Visibility) -> Self {
        Self { x, y, visibility }
    }

    /// Whether this slot holds a placed keypoint.
    pub fn is_set(&self) -> bool {
        self.visibility.is_set()
    }
}

/// Axis-aligned bounding box in normalized center/size form.
///
/// All four components are fractions of the image width/height in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x_center: f32,
    pub y_center: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x_center: f32, y_center: f32, width: f32, height: f32) -> Self {
        Self {
            x_center,
            y_center,
            width,
            height,
        }
    }

    /// Build a normalized box from two corner points in image pixels.
    /// Corner order does not matter.
    pub fn from_corners_px(
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        image_w: f32,
        image_h: f32,
    ) -> Self {
        let (left, right) = (x1.min(x2), x1.max(x2));
        let (top, bottom) = (y1.min(y2), y1.max(y2));
        Self {
            x_center: (left + right) / 2.0 / image_w,
            y_center: (top + bottom) / 2.0 / image_h,
            width: (right - left) / image_w,
            height: (bottom - top) / image_h,
        }
    }

    /// Pixel-space corners `(x1, y1, x2, y2)` for the given image size.
    pub fn corners_px(&self, image_w: f32, image_h: f32) -> (f32, f32, f32, f32) {
        let x1 = (self.x_center - self.width / 2.0) * image_w;
        let y1 = (self.y_center - self.height / 2.0) * image_h;
        let x2 = (self.x_center + self.width / 2.0) * image_w;
        let y2 = (self.y_center + self.height / 2.0) * image_h;
        (x1, y1, x2, y2)
    }

    /// Point-in-box test in normalized coordinates.
    pub fn contains_norm(&self, nx: f32, ny: f32) -> bool {
        let half_w = self.width / 2.0;
        let half_h = self.height / 2.0;
        nx >= self.x_center - half_w
            && nx <= self.x_center + half_w
            && ny >= self.y_center - half_h
            && ny <= self.y_center + half_h
    }
}

/// One labeled object instance: class, box, and exactly nine keypoint slots.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    pub class_id: usize,
    pub bbox: BoundingBox,
    pub keypoints: [Keypoint; KEYPOINT_COUNT],
}

impl Annotation {
    /// Create an annotation with all keypoint slots absent.
    pub fn new(class_id: usize, bbox: BoundingBox) -> Self {
        Self {
            class_id,
            bbox,
            keypoints: [Keypoint::default(); KEYPOINT_COUNT],
        }
    }

    /// Index of the first slot that has not been placed yet, scanning in
    /// array order.
    pub fn first_absent_slot(&self) -> Option<usize> {
        self.keypoints.iter().position(|kp| !kp.is_set())
    }

    /// Number of placed keypoints.
    pub fn placed_count(&self) -> usize {
        self.keypoints.iter().filter(|kp| kp.is_set()).count()
    }
}
