//! Static map model.
//!
//! A map is a flat list of elements: start points (pickup stations), end
//! points (delivery stations), and the AGVs' initial poses. All three
//! share the shape `(name, x, y, optional heading)` and are modeled as a
//! single struct with a kind tag.

use serde::{Deserialize, Serialize};

use super::{Direction, Point, Rect};

/// Kind of a map element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapElementKind {
    /// A pickup station; tasks originate here.
    StartPoint,
    /// A delivery station; tasks terminate here.
    EndPoint,
    /// An AGV's initial pose.
    Agv,
}

/// One row of the map: a station or an AGV initial pose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapElement {
    /// Element kind.
    pub kind: MapElementKind,
    /// Unique name within its kind (e.g. `SP01`, `EP03`, `AGV07`).
    pub name: String,
    /// Grid cell.
    pub position: Point,
    /// Initial heading; present for AGVs, absent for stations.
    pub heading: Option<Direction>,
}

impl MapElement {
    /// Creates a start point.
    pub fn start_point(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            kind: MapElementKind::StartPoint,
            name: name.into(),
            position: Point::new(x, y),
            heading: None,
        }
    }

    /// Creates an end point.
    pub fn end_point(name: impl Into<String>, x: i32, y: i32) -> Self {
        Self {
            kind: MapElementKind::EndPoint,
            name: name.into(),
            position: Point::new(x, y),
            heading: None,
        }
    }

    /// Creates an AGV initial pose.
    pub fn agv(name: impl Into<String>, x: i32, y: i32, heading: Direction) -> Self {
        Self {
            kind: MapElementKind::Agv,
            name: name.into(),
            position: Point::new(x, y),
            heading: Some(heading),
        }
    }
}

/// Bounds spanned by the element set; the zero rect when empty.
pub fn map_bounds(elements: &[MapElement]) -> Rect {
    let mut iter = elements.iter();
    let first = match iter.next() {
        Some(element) => element.position,
        None => return Rect::new(0, 0, 0, 0),
    };

    let mut bounds = Rect::new(first.x, first.y, first.x, first.y);
    for element in iter {
        bounds.left = bounds.left.min(element.position.x);
        bounds.right = bounds.right.max(element.position.x);
        bounds.bottom = bounds.bottom.min(element.position.y);
        bounds.top = bounds.top.max(element.position.y);
    }
    bounds
}
