/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies source layout, kernel, damping and depth options for equivalent-source models.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies source layout, kernel, damping and depth options for equivalent-source models.
use bouguer_utils::KernelType;
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Where the point sources are placed horizontally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum SourceLayout {
    /// One source beneath every data point.
    #[default]
    AtData,

    /// One source beneath the median position of the data falling in each
    /// `block_size x block_size` block.
    BlockAveraged { block_size: f64 },

    /// Explicit source positions. `depth` is not applied.
    Custom {
        easting: Vec<f64>,
        northing: Vec<f64>,
        upward: Vec<f64>,
    },
}

/// Green's function linking a source coefficient to the field at a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SourceKernel {
    /// `1 / r`.
    #[default]
    InverseDistance,

    /// Downward attraction of a unit point mass, in mGal.
    PointMassGz,
}

impl From<SourceKernel> for KernelType {
    fn from(value: SourceKernel) -> KernelType {
        match value {
            SourceKernel::InverseDistance => KernelType::InverseDistance,
            SourceKernel::PointMassGz => KernelType::PointMassGz,
        }
    }
}

/// Settings of one equivalent-source model.
///
/// ### Default Values
/// - `damping`: `0.0`
/// - `depth`: `1000.0`
/// - `layout`: [`SourceLayout::AtData`]
/// - `kernel`: [`SourceKernel::InverseDistance`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquivalentSourceSettings {
    /// Ridge regularisation applied to the column-scaled jacobian.
    pub damping: f64,

    /// Distance (m) below each data point at which its source is placed.
    pub depth: f64,

    /// Horizontal source layout.
    pub layout: SourceLayout,

    /// Green's function.
    pub kernel: SourceKernel,
}

impl Default for EquivalentSourceSettings {
    fn default() -> Self {
        EquivalentSourceSettings::builder().build()
    }
}

impl EquivalentSourceSettings {
    /// Returns a new [`EquivalentSourceSettingsBuilder`] with default values.
    pub fn builder() -> EquivalentSourceSettingsBuilder {
        EquivalentSourceSettingsBuilder::new()
    }

    /// Checks that damping and depth are usable.
    pub fn validate(&self) -> Result<()> {
        if !self.damping.is_finite() || self.damping < 0.0 {
            return Err(PipelineError::invalid("damping", self.damping, "must be finite and non-negative"));
        }
        if !self.depth.is_finite() || self.depth <= 0.0 {
            return Err(PipelineError::invalid("depth", self.depth, "must be finite and positive"));
        }
        match &self.layout {
            SourceLayout::AtData => {}
            SourceLayout::BlockAveraged { block_size } => {
                if !block_size.is_finite() || *block_size <= 0.0 {
                    return Err(PipelineError::invalid("block_size", block_size, "must be finite and positive"));
                }
            }
            SourceLayout::Custom { easting, northing, upward } => {
                if easting.len() != northing.len() || easting.len() != upward.len() {
                    return Err(PipelineError::InputShapeMismatch {
                        context: "custom source coordinates".into(),
                        expected: (easting.len(), 3),
                        found: (northing.len().min(upward.len()), 3),
                    });
                }
                if easting.is_empty() {
                    return Err(PipelineError::invalid("layout", "Custom", "needs at least one source"));
                }
            }
        }
        Ok(())
    }
}

/// A convenience builder for constructing an [`EquivalentSourceSettings`] instance.
///
/// See [`EquivalentSourceSettings`] for details on each field.
#[derive(Debug, Clone)]
pub struct EquivalentSourceSettingsBuilder {
    damping: f64,
    depth: f64,
    layout: SourceLayout,
    kernel: SourceKernel,
}

impl EquivalentSourceSettingsBuilder {
    fn new() -> Self {
        Self {
            damping: 0.0,
            depth: 1000.0,
            layout: SourceLayout::AtData,
            kernel: SourceKernel::InverseDistance,
        }
    }

    /// Sets the damping (ridge) parameter.
    pub fn damping(mut self, damping: f64) -> Self {
        self.damping = damping;
        self
    }

    /// Sets the relative source depth in metres.
    pub fn depth(mut self, depth: f64) -> Self {
        self.depth = depth;
        self
    }

    /// Sets the source layout.
    pub fn layout(mut self, layout: SourceLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Sets the Green's function.
    pub fn kernel(mut self, kernel: SourceKernel) -> Self {
        self.kernel = kernel;
        self
    }

    /// Builds and returns an [`EquivalentSourceSettings`] instance.
    pub fn build(self) -> EquivalentSourceSettings {
        EquivalentSourceSettings {
            damping: self.damping,
            depth: self.depth,
            layout: self.layout,
            kernel: self.kernel,
        }
    }
}
