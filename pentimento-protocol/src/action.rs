//! Typed commands decoded from [`Fields`]

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::CodecError;
use crate::fields::Fields;

/// Name of the field selecting the action
pub const ACTION_FIELD: &str = "action";

/// Largest accepted position or size, in cells
///
/// Terminal grids are sized in `u16` cells; nothing beyond that can be visible.
pub const MAX_CELLS: u32 = u16::MAX as u32;

/// Discriminant of [`Action`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    Add,
    Remove,
    QueryWindows,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Add => "add",
            ActionKind::Remove => "remove",
            ActionKind::QueryWindows => "query_windows",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(ActionKind::Add),
            "remove" => Ok(ActionKind::Remove),
            "query_windows" => Ok(ActionKind::QueryWindows),
            other => Err(CodecError::UnknownAction(other.to_string())),
        }
    }
}

/// How an image is fitted into its placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Cut the image to the placement, no resizing
    Crop,
    /// Stretch to the placement, ignoring the aspect ratio
    Distort,
    /// Shrink or grow to fit, keeping the aspect ratio
    FitContain,
    /// Shrink to fit, never grow
    #[default]
    Contain,
    /// Grow or shrink to cover the placement, then crop
    ForcedCover,
    /// Like `ForcedCover` but falls back to `Contain` for small images
    Cover,
}

impl ScalerKind {
    pub const ALL: [ScalerKind; 6] = [
        ScalerKind::Crop,
        ScalerKind::Distort,
        ScalerKind::FitContain,
        ScalerKind::Contain,
        ScalerKind::ForcedCover,
        ScalerKind::Cover,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScalerKind::Crop => "crop",
            ScalerKind::Distort => "distort",
            ScalerKind::FitContain => "fit_contain",
            ScalerKind::Contain => "contain",
            ScalerKind::ForcedCover => "forced_cover",
            ScalerKind::Cover => "cover",
        }
    }
}

impl fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScalerKind {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ScalerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CodecError::InvalidField {
                field: "scaler".to_string(),
                value: s.to_string(),
                expected: "one of crop, distort, fit_contain, contain, forced_cover, cover",
            })
    }
}

/// Place (or replace) an image layer
#[derive(Debug, Clone, PartialEq)]
pub struct AddLayer {
    pub identifier: String,
    pub path: PathBuf,
    /// Column, relative to the pane
    pub x: i32,
    /// Row, relative to the pane
    pub y: i32,
    /// Width in cells; `None` lets the image decide
    pub width: Option<u32>,
    /// Height in cells; `None` lets the image decide
    pub height: Option<u32>,
    pub scaler: ScalerKind,
    /// Horizontal crop anchor in `0.0..=1.0`
    pub scaling_position_x: f32,
    /// Vertical crop anchor in `0.0..=1.0`
    pub scaling_position_y: f32,
    pub draw: bool,
}

/// Remove an image layer
#[derive(Debug, Clone, PartialEq)]
pub struct RemoveLayer {
    pub identifier: String,
    pub draw: bool,
}

/// A command understood by the daemon
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(AddLayer),
    Remove(RemoveLayer),
    /// Re-read the visible client set and reconcile windows
    QueryWindows,
}

impl Action {
    /// Resolve the `action` field and decode the matching variant
    pub fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let kind: ActionKind = fields.require_str(ACTION_FIELD)?.parse()?;

        match kind {
            ActionKind::Add => AddLayer::decode(fields).map(Action::Add),
            ActionKind::Remove => RemoveLayer::decode(fields).map(Action::Remove),
            ActionKind::QueryWindows => Ok(Action::QueryWindows),
        }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Add(_) => ActionKind::Add,
            Action::Remove(_) => ActionKind::Remove,
            Action::QueryWindows => ActionKind::QueryWindows,
        }
    }
}

impl AddLayer {
    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        let identifier = require_identifier(fields)?;
        let path = PathBuf::from(fields.require_str("path")?);

        let x = position(fields, "x")?;
        let y = position(fields, "y")?;

        // Zero means "unset"; the max_* spellings are accepted as fallbacks
        let width = match extent(fields, "width")? {
            Some(w) if w > 0 => Some(w),
            _ => extent(fields, "max_width")?.filter(|w| *w > 0),
        };
        let height = match extent(fields, "height")? {
            Some(h) if h > 0 => Some(h),
            _ => extent(fields, "max_height")?.filter(|h| *h > 0),
        };

        let scaler = match fields.get_str("scaler").filter(|s| !s.is_empty()) {
            Some(name) => name.parse()?,
            None => ScalerKind::default(),
        };

        Ok(Self {
            identifier,
            path,
            x,
            y,
            width,
            height,
            scaler,
            scaling_position_x: unit_interval(fields, "scaling_position_x")?,
            scaling_position_y: unit_interval(fields, "scaling_position_y")?,
            draw: fields.get_bool("draw")?.unwrap_or(true),
        })
    }
}

impl RemoveLayer {
    fn decode(fields: &Fields) -> Result<Self, CodecError> {
        Ok(Self {
            identifier: require_identifier(fields)?,
            draw: fields.get_bool("draw")?.unwrap_or(true),
        })
    }
}

fn require_identifier(fields: &Fields) -> Result<String, CodecError> {
    let identifier = fields.require_str("identifier")?;
    if identifier.is_empty() {
        return Err(CodecError::InvalidField {
            field: "identifier".to_string(),
            value: identifier,
            expected: "a non-empty string",
        });
    }
    Ok(identifier)
}

/// Column or row, `0` when absent
fn position(fields: &Fields, key: &str) -> Result<i32, CodecError> {
    match fields.get_i32(key)? {
        None => Ok(0),
        Some(v) if v.unsigned_abs() <= MAX_CELLS => Ok(v),
        Some(v) => Err(out_of_range(key, v)),
    }
}

fn extent(fields: &Fields, key: &str) -> Result<Option<u32>, CodecError> {
    match fields.get_u32(key)? {
        Some(v) if v > MAX_CELLS => Err(out_of_range(key, v)),
        other => Ok(other),
    }
}

fn out_of_range(key: &str, value: impl ToString) -> CodecError {
    CodecError::InvalidField {
        field: key.to_string(),
        value: value.to_string(),
        expected: "at most 65535 cells",
    }
}

fn unit_interval(fields: &Fields, key: &str) -> Result<f32, CodecError> {
    match fields.get_f32(key)? {
        None => Ok(0.0),
        Some(v) if (0.0..=1.0).contains(&v) => Ok(v),
        Some(v) => Err(CodecError::InvalidField {
            field: key.to_string(),
            value: v.to_string(),
            expected: "a number between 0.0 and 1.0",
        }),
    }
}
