// Copyright 2025 the Gridscape Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error type for configuration and structural operations.

use crate::entity::EntityId;

/// Errors returned by fallible scene operations.
///
/// Per-frame work never fails; only configuration and attach requests do.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum SceneError {
    /// Grid cell size must be finite and positive.
    #[error("invalid cell size: {0}")]
    InvalidCellSize(f64),

    /// Viewport size must be finite and positive.
    #[error("invalid viewport size: {width}x{height}")]
    InvalidViewport {
        /// Requested width.
        width: f64,
        /// Requested height.
        height: f64,
    },

    /// Full-redraw ratio must be finite and non-negative.
    #[error("invalid full redraw ratio: {0}")]
    InvalidRedrawRatio(f64),

    /// The entity handle no longer refers to a live entity.
    #[error("stale entity handle: {0:?}")]
    StaleEntity(EntityId),

    /// Attaching would make an entity its own ancestor.
    #[error("attaching {child:?} to {parent:?} would create a cycle")]
    AttachCycle {
        /// Requested parent.
        parent: EntityId,
        /// Requested child.
        child: EntityId,
    },
}

/// Result alias for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;
