//! Drop-target geometry
//!
//! Pure functions over element rectangles. The view layer reads the
//! bounding boxes of the candidate children (excluding the element being
//! dragged) and asks here where a drop would land.

use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Viewport-relative box, as returned by `getBoundingClientRect`
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self { left, top, width, height }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    pub fn center_x(&self) -> f64 {
        self.left + self.width / 2.0
    }

    pub fn center_y(&self) -> f64 {
        self.top + self.height / 2.0
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right() && point.y >= self.top && point.y < self.bottom()
    }
}

/// Bucket rects (in DOM order) into visual rows of a wrapping layout.
/// A rect starts a new row when its top edge is at least half an item
/// height away from the first rect of the current row.
pub fn group_rows(rects: &[Rect]) -> Vec<Range<usize>> {
    let mut rows = Vec::new();
    if rects.is_empty() {
        return rows;
    }

    let mut start = 0;
    for (i, rect) in rects.iter().enumerate().skip(1) {
        let head = &rects[start];
        if (rect.top - head.top).abs() >= head.height / 2.0 {
            rows.push(start..i);
            start = i;
        }
    }
    rows.push(start..rects.len());
    rows
}

/// Insertion index for a pointer over a wrapping list of `rects`.
///
/// The active row is the first one whose bottom edge lies below the
/// pointer (the last row when the pointer is below everything). Within it
/// the pointer is compared against each item's horizontal midpoint.
pub fn insertion_index(rects: &[Rect], point: Point) -> usize {
    let rows = group_rows(rects);
    let Some(last) = rows.last() else {
        return 0;
    };

    let row = rows
        .iter()
        .find(|row| {
            let bottom = rects[(*row).clone()]
                .iter()
                .map(Rect::bottom)
                .fold(f64::MIN, f64::max);
            point.y < bottom
        })
        .unwrap_or(last);

    row.clone()
        .find(|&i| point.x < rects[i].center_x())
        .unwrap_or(row.end)
}

/// A preview at the dragged item's own slot changes nothing.
/// `index` is measured with the dragged item taken out of the list.
pub fn preview_is_noop(index: usize, source_index: Option<usize>) -> bool {
    source_index == Some(index)
}

/// Slot for a tier row drop: before the hovered row in its upper half,
/// after it in the lower half.
pub fn tier_drop_slot(row_rect: &Rect, row_index: usize, y: f64) -> usize {
    if y < row_rect.center_y() {
        row_index
    } else {
        row_index + 1
    }
}

/// Slot under the pointer given every tier row's box in display order.
pub fn tier_slot_at(rows: &[Rect], y: f64) -> usize {
    rows.iter()
        .position(|rect| y < rect.center_y())
        .unwrap_or(rows.len())
}

/// Dropping a tier directly before or after itself leaves the order alone.
pub fn tier_slot_is_noop(slot: usize, tier_index: usize) -> bool {
    slot == tier_index || slot == tier_index + 1
}
