//! Scaler geometry
//!
//! A scaler decides how large an image is drawn inside its placement and
//! which part of the resized image stays visible.

use pentimento_protocol::ScalerKind;
use pentimento_utils::{PentimentoError, Result};

/// Axis-aligned rectangle in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Outcome of a scaler
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaled {
    /// Size the source image is resized to
    pub width: u32,
    pub height: u32,
    /// Visible part of the resized image
    pub crop: Rect,
}

impl Scaled {
    fn uncropped(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            crop: Rect {
                x: 0,
                y: 0,
                width,
                height,
            },
        }
    }
}

/// Fit an `image` sized picture into an `area` sized placement
///
/// `position` anchors the visible region when the result is larger than the
/// area: `(0.0, 0.0)` keeps the top-left corner, `(1.0, 1.0)` the
/// bottom-right one.
pub fn scale(
    kind: ScalerKind,
    image: (u32, u32),
    area: (u32, u32),
    position: (f32, f32),
) -> Result<Scaled> {
    let (iw, ih) = image;
    let (aw, ah) = area;

    if iw == 0 || ih == 0 {
        return Err(PentimentoError::geometry(format!("image has no pixels ({}x{})", iw, ih)));
    }
    if aw == 0 || ah == 0 {
        return Err(PentimentoError::geometry(format!("placement has no area ({}x{})", aw, ah)));
    }

    let fits = iw <= aw && ih <= ah;

    Ok(match kind {
        ScalerKind::Crop => {
            let width = iw.min(aw);
            let height = ih.min(ah);
            Scaled {
                width: iw,
                height: ih,
                crop: Rect {
                    x: anchor(iw - width, position.0),
                    y: anchor(ih - height, position.1),
                    width,
                    height,
                },
            }
        }
        ScalerKind::Distort => Scaled::uncropped(aw, ah),
        ScalerKind::FitContain => fit_contain(image, area),
        ScalerKind::Contain if fits => Scaled::uncropped(iw, ih),
        ScalerKind::Contain => fit_contain(image, area),
        ScalerKind::Cover if fits => Scaled::uncropped(iw, ih),
        ScalerKind::Cover | ScalerKind::ForcedCover => forced_cover(image, area, position),
    })
}

fn fit_contain((iw, ih): (u32, u32), (aw, ah): (u32, u32)) -> Scaled {
    let factor = (f64::from(aw) / f64::from(iw)).min(f64::from(ah) / f64::from(ih));
    let width = resize(iw, factor).min(aw);
    let height = resize(ih, factor).min(ah);
    Scaled::uncropped(width, height)
}

fn forced_cover((iw, ih): (u32, u32), (aw, ah): (u32, u32), position: (f32, f32)) -> Scaled {
    let factor = (f64::from(aw) / f64::from(iw)).max(f64::from(ah) / f64::from(ih));
    let width = resize(iw, factor).max(aw);
    let height = resize(ih, factor).max(ah);

    Scaled {
        width,
        height,
        crop: Rect {
            x: anchor(width - aw, position.0),
            y: anchor(height - ah, position.1),
            width: aw,
            height: ah,
        },
    }
}

fn resize(length: u32, factor: f64) -> u32 {
    ((f64::from(length) * factor).round() as u32).max(1)
}

fn anchor(slack: u32, position: f32) -> u32 {
    (f64::from(slack) * f64::from(position.clamp(0.0, 1.0))).round() as u32
}
