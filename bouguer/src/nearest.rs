/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements a nearest neighbour gridder backed by an R-tree.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::Mat;
use rayon::prelude::*;

use crate::error::{PipelineError, Result};
use crate::gridders::{Gridder, Predictor, check_fit_inputs};
use crate::spatial::PointIndex;

/// Assigns every query the value of the closest data point.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestGridder;

/// A fitted nearest neighbour lookup.
#[derive(Debug, Clone)]
pub struct NearestModel {
    index: PointIndex,
    values: Vec<f64>,
}

impl Gridder for NearestGridder {
    type Model = NearestModel;

    fn fit(&self, coordinates: &Mat<f64>, values: &[f64]) -> Result<NearestModel> {
        check_fit_inputs("nearest neighbour fit", coordinates, values, 2)?;
        if values.is_empty() {
            return Err(PipelineError::InputShapeMismatch {
                context: "nearest neighbour fit needs at least one point".into(),
                expected: (1, 2),
                found: coordinates.shape(),
            });
        }

        let x = coordinates.col(0).iter().copied().collect::<Vec<_>>();
        let y = coordinates.col(1).iter().copied().collect::<Vec<_>>();

        Ok(NearestModel {
            index: PointIndex::new(&x, &y),
            values: values.to_vec(),
        })
    }
}

impl Predictor for NearestModel {
    fn predict(&self, coordinates: &Mat<f64>) -> Result<Vec<f64>> {
        if coordinates.ncols() < 2 {
            return Err(PipelineError::InputShapeMismatch {
                context: "nearest neighbour prediction coordinates".into(),
                expected: (coordinates.nrows(), 2),
                found: coordinates.shape(),
            });
        }

        (0..coordinates.nrows())
            .into_par_iter()
            .map(|i| {
                self.index
                    .nearest(coordinates[(i, 0)], coordinates[(i, 1)])
                    .map(|k| self.values[k])
                    .ok_or_else(|| PipelineError::NonFiniteValue {
                        context: "nearest neighbour lookup".into(),
                        index: i,
                    })
            })
            .collect()
    }
}
