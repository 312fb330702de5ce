// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scene configuration.

use gridscape_index::DEFAULT_CELL_SIZE;
use kurbo::{Rect, Size};

use crate::error::{SceneError, SceneResult};

/// Default share of dirty rectangles to raster entities above which a flush
/// falls back to redrawing everything.
pub const DEFAULT_FULL_REDRAW_RATIO: f64 = 0.6;

/// The visible part of the world.
///
/// `x` and `y` are the scroll offset: the world point shown at the top-left
/// of the screen is `(-x, -y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Viewport {
    /// Horizontal scroll offset.
    pub x: f64,
    /// Vertical scroll offset.
    pub y: f64,
    /// Visible width.
    pub width: f64,
    /// Visible height.
    pub height: f64,
}

impl Viewport {
    /// Create a viewport of the given size at scroll offset zero.
    pub const fn new(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }

    /// Return a copy scrolled to `(x, y)`.
    pub const fn with_offset(mut self, x: f64, y: f64) -> Self {
        self.x = x;
        self.y = y;
        self
    }

    /// Visible size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// The world-space rectangle currently on screen.
    pub fn world_rect(&self) -> Rect {
        Rect::new(-self.x, -self.y, self.width - self.x, self.height - self.y)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

/// Tunables for a [`World`](crate::World).
///
/// ```
/// use gridscape_scene::{SceneConfig, Viewport};
///
/// let config = SceneConfig::default()
///     .with_cell_size(32.0)
///     .with_viewport(Viewport::new(320.0, 240.0));
/// assert!(config.validate().is_ok());
/// assert!(config.with_full_redraw_ratio(-1.0).validate().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SceneConfig {
    /// Spatial hash cell size in world units.
    pub cell_size: f64,
    /// Visible region used to discard off-screen damage.
    pub viewport: Viewport,
    /// Dirty-rect count, relative to the raster entity count, above which a
    /// flush redraws everything instead of merging rectangles.
    pub full_redraw_ratio: f64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            cell_size: DEFAULT_CELL_SIZE,
            viewport: Viewport::default(),
            full_redraw_ratio: DEFAULT_FULL_REDRAW_RATIO,
        }
    }
}

impl SceneConfig {
    /// Set the spatial hash cell size.
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the viewport.
    pub fn with_viewport(mut self, viewport: Viewport) -> Self {
        self.viewport = viewport;
        self
    }

    /// Set the full-redraw ratio.
    pub fn with_full_redraw_ratio(mut self, ratio: f64) -> Self {
        self.full_redraw_ratio = ratio;
        self
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> SceneResult<()> {
        if !(self.cell_size.is_finite() && self.cell_size > 0.0) {
            return Err(SceneError::InvalidCellSize(self.cell_size));
        }
        validate_viewport(&self.viewport)?;
        if !(self.full_redraw_ratio.is_finite() && self.full_redraw_ratio >= 0.0) {
            return Err(SceneError::InvalidRedrawRatio(self.full_redraw_ratio));
        }
        Ok(())
    }
}

pub(crate) fn validate_viewport(viewport: &Viewport) -> SceneResult<()> {
    let Viewport {
        x,
        y,
        width,
        height,
    } = *viewport;
    let sized = width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0;
    if !sized || !x.is_finite() || !y.is_finite() {
        return Err(SceneError::InvalidViewport { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = SceneConfig::default();
        assert_eq!(c.cell_size, 64.0);
        assert_eq!(c.viewport, Viewport::new(800.0, 600.0));
        assert_eq!(c.full_redraw_ratio, 0.6);
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn rejects_bad_values() {
        let c = SceneConfig::default();
        assert_eq!(
            c.with_cell_size(0.0).validate(),
            Err(SceneError::InvalidCellSize(0.0))
        );
        assert!(c.with_cell_size(f64::NAN).validate().is_err());
        assert_eq!(
            c.with_viewport(Viewport::new(0.0, 10.0)).validate(),
            Err(SceneError::InvalidViewport {
                width: 0.0,
                height: 10.0
            })
        );
        assert!(c.with_full_redraw_ratio(f64::INFINITY).validate().is_err());
        assert!(c.with_full_redraw_ratio(0.0).validate().is_ok());
    }

    #[test]
    fn scrolled_world_rect() {
        let v = Viewport::new(100.0, 50.0).with_offset(-20.0, 10.0);
        assert_eq!(v.world_rect(), Rect::new(20.0, -10.0, 120.0, 40.0));
    }
}
