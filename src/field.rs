use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// The reconciliation strategy a column is handled by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnType {
    Box,
    Length,
    Point,
    Select,
    Text,
    NoOp,
    Same,
}

impl ColumnType {
    pub const ALL: [Self; 7] = [
        Self::Box,
        Self::Length,
        Self::Point,
        Self::Select,
        Self::Text,
        Self::NoOp,
        Self::Same,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Box => "box",
            Self::Length => "length",
            Self::Point => "point",
            Self::Select => "select",
            Self::Text => "text",
            Self::NoOp => "noop",
            Self::Same => "same",
        }
    }
}

impl Display for ColumnType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColumnType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|column_type| column_type.as_str() == trimmed)
            .ok_or_else(|| format!("'{trimmed}' is not a valid column type"))
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_coordinate(value: f64) -> i64 {
    value.round() as i64
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoxGeometry {
    pub left: i64,
    pub right: i64,
    pub top: i64,
    pub bottom: i64,
}

impl BoxGeometry {
    #[must_use]
    pub fn from_origin_and_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            left: round_coordinate(x),
            right: round_coordinate(x + width),
            top: round_coordinate(y),
            bottom: round_coordinate(y + height),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineGeometry {
    pub x1: i64,
    pub y1: i64,
    pub x2: i64,
    pub y2: i64,
}

impl LineGeometry {
    #[must_use]
    pub fn from_endpoints(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            x1: round_coordinate(x1),
            y1: round_coordinate(y1),
            x2: round_coordinate(x2),
            y2: round_coordinate(y2),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointGeometry {
    pub x: i64,
    pub y: i64,
}

impl PointGeometry {
    #[must_use]
    pub fn from_coordinates(x: f64, y: f64) -> Self {
        Self {
            x: round_coordinate(x),
            y: round_coordinate(y),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One field's value within a single transcription.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Box(BoxGeometry),
    Length(LineGeometry),
    Point(PointGeometry),
    Select(String),
    Text(String),
    NoOp(String),
    Same(String),
}

impl FieldValue {
    #[must_use]
    pub const fn column_type(&self) -> ColumnType {
        match self {
            Self::Box(_) => ColumnType::Box,
            Self::Length(_) => ColumnType::Length,
            Self::Point(_) => ColumnType::Point,
            Self::Select(_) => ColumnType::Select,
            Self::Text(_) => ColumnType::Text,
            Self::NoOp(_) => ColumnType::NoOp,
            Self::Same(_) => ColumnType::Same,
        }
    }

    /// The string payload of the string-valued variants.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Select(value) | Self::Text(value) | Self::NoOp(value) | Self::Same(value) => {
                Some(value)
            }
            Self::Box(_) | Self::Length(_) | Self::Point(_) => None,
        }
    }

    /// Single-cell rendering used for the unreconciled output rows.
    #[must_use]
    pub fn render(&self) -> String {
        match self {
            Self::Box(geometry) => format!(
                r#"{{"left":{},"right":{},"top":{},"bottom":{}}}"#,
                geometry.left, geometry.right, geometry.top, geometry.bottom
            ),
            Self::Length(geometry) => format!(
                r#"{{"x1":{},"y1":{},"x2":{},"y2":{}}}"#,
                geometry.x1, geometry.y1, geometry.x2, geometry.y2
            ),
            Self::Point(geometry) => format!(r#"{{"x":{},"y":{}}}"#, geometry.x, geometry.y),
            Self::Select(value) | Self::Text(value) | Self::NoOp(value) | Self::Same(value) => {
                value.clone()
            }
        }
    }
}
