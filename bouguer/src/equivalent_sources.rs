/////////////////////////////////////////////////////////////////////////////////////////////
//
// Fits and evaluates damped equivalent-source models of potential field data.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # equivalent_sources
//!
//! A field measured on an uneven surface is modelled as the combined effect of
//! point sources buried beneath the data. The source coefficients are fitted by
//! damped least squares; the model then predicts the field at any location,
//! which is how the regional field is separated and the residual is gridded.
//!
//! Deep sources give smooth, long-wavelength models; shallow sources follow
//! the short-wavelength content of the data.
//!
//! # References
//! 1. Dampney, C. N. G., 1969. The equivalent source technique. Geophysics, 34(1), p.39-53.
//! 2. Soler, S. R. and Uieda, L., 2021. Gradient-boosted equivalent sources.
//!    Geophysical Journal International, 227(3), p.1768-1783.

use std::collections::BTreeMap;

use bouguer_utils::{KernelType, get_a_matrix, kernel_value};
use faer::Mat;
use rayon::prelude::*;

use crate::error::{PipelineError, Result};
use crate::gridders::{Gridder, Predictor, check_fit_inputs};
use crate::linalg::damped_least_squares;
use crate::source_config::{EquivalentSourceSettings, SourceLayout};

/// Statistics of a completed fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitSummary {
    pub num_data: usize,
    pub num_sources: usize,
    pub damping: f64,
    pub depth: f64,
    /// Root mean square of the data minus the prediction at the data points.
    pub rms_misfit: f64,
    pub condition_estimate: f64,
}

/// Equivalent-source gridder.
///
/// Coordinates passed to `fit` and `predict` have three columns:
/// easting, northing and upward, all in metres.
#[derive(Debug, Clone, Default)]
pub struct EquivalentSources {
    pub settings: EquivalentSourceSettings,
}

impl EquivalentSources {
    pub fn new(settings: EquivalentSourceSettings) -> Self {
        Self { settings }
    }

    /// Source positions (`n_sources x 3`) for the data at `coordinates`.
    pub fn source_locations(&self, coordinates: &Mat<f64>) -> Mat<f64> {
        let depth = self.settings.depth;
        match &self.settings.layout {
            SourceLayout::AtData => Mat::from_fn(coordinates.nrows(), 3, |i, j| match j {
                2 => coordinates[(i, 2)] - depth,
                _ => coordinates[(i, j)],
            }),
            SourceLayout::BlockAveraged { block_size } => {
                let reduced = block_average(coordinates, *block_size);
                Mat::from_fn(reduced.nrows(), 3, |i, j| match j {
                    2 => reduced[(i, 2)] - depth,
                    _ => reduced[(i, j)],
                })
            }
            SourceLayout::Custom {
                easting,
                northing,
                upward,
            } => Mat::from_fn(easting.len(), 3, |i, j| match j {
                0 => easting[i],
                1 => northing[i],
                _ => upward[i],
            }),
        }
    }
}

/// Median position of the points in each non-empty `block_size` square,
/// ordered by block (south to north, then west to east).
fn block_average(coordinates: &Mat<f64>, block_size: f64) -> Mat<f64> {
    let n = coordinates.nrows();
    if n == 0 {
        return Mat::zeros(0, 3);
    }
    let west = coordinates.col(0).iter().fold(f64::INFINITY, |a, b| a.min(*b));
    let south = coordinates.col(1).iter().fold(f64::INFINITY, |a, b| a.min(*b));

    let mut blocks: BTreeMap<(u64, u64), [Vec<f64>; 3]> = BTreeMap::new();
    for i in 0..n {
        let col = ((coordinates[(i, 0)] - west) / block_size).floor() as u64;
        let row = ((coordinates[(i, 1)] - south) / block_size).floor() as u64;
        let entry = blocks.entry((row, col)).or_default();
        for (d, values) in entry.iter_mut().enumerate() {
            values.push(coordinates[(i, d)]);
        }
    }

    let medians = blocks
        .into_values()
        .map(|mut block| block.each_mut().map(|values| median(values)))
        .collect::<Vec<_>>();
    Mat::from_fn(medians.len(), 3, |i, j| medians[i][j])
}

/// Median of a non-empty, finite slice. Reorders `values`.
fn median(values: &mut [f64]) -> f64 {
    values.sort_unstable_by(f64::total_cmp);
    let mid = values.len() / 2;
    match values.len() % 2 {
        0 => 0.5 * (values[mid - 1] + values[mid]),
        _ => values[mid],
    }
}

/// A fitted equivalent-source model.
#[derive(Debug, Clone)]
pub struct FittedSources {
    sources: Mat<f64>,
    coefficients: Vec<f64>,
    kernel: KernelType,
    summary: FitSummary,
}

impl FittedSources {
    /// Source positions (`n_sources x 3`).
    pub fn sources(&self) -> &Mat<f64> {
        &self.sources
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn summary(&self) -> &FitSummary {
        &self.summary
    }
}

impl Gridder for EquivalentSources {
    type Model = FittedSources;

    fn fit(&self, coordinates: &Mat<f64>, values: &[f64]) -> Result<FittedSources> {
        self.settings.validate()?;
        check_fit_inputs("equivalent source fit", coordinates, values, 3)?;

        if values.is_empty() {
            return Err(PipelineError::InputShapeMismatch {
                context: "equivalent source fit needs data".into(),
                expected: (1, 3),
                found: coordinates.shape(),
            });
        }

        let kernel = KernelType::from(self.settings.kernel);
        let data_points = coordinates.subcols(0, 3).to_owned();
        let sources = self.source_locations(&data_points);

        let jacobian = get_a_matrix(&data_points, &sources, kernel);
        let solution = damped_least_squares(
            "equivalent source fit",
            &jacobian,
            values,
            self.settings.damping,
        )?;

        let coefficients = Mat::from_fn(sources.nrows(), 1, |i, _| solution.parameters[i]);
        let predicted = jacobian.as_ref() * coefficients.as_ref();
        let sum_sq = values
            .iter()
            .enumerate()
            .map(|(i, v)| (v - predicted[(i, 0)]).powi(2))
            .sum::<f64>();
        let rms_misfit = (sum_sq / values.len() as f64).sqrt();

        Ok(FittedSources {
            summary: FitSummary {
                num_data: values.len(),
                num_sources: sources.nrows(),
                damping: self.settings.damping,
                depth: self.settings.depth,
                rms_misfit,
                condition_estimate: solution.condition_estimate,
            },
            sources,
            coefficients: solution.parameters,
            kernel,
        })
    }
}

impl Predictor for FittedSources {
    /// `A(query, sources) · c`, evaluated one query at a time so large grids
    /// never materialise the full kernel matrix.
    fn predict(&self, coordinates: &Mat<f64>) -> Result<Vec<f64>> {
        if coordinates.ncols() < 3 {
            return Err(PipelineError::InputShapeMismatch {
                context: "equivalent source prediction coordinates".into(),
                expected: (coordinates.nrows(), 3),
                found: coordinates.shape(),
            });
        }

        let predicted = (0..coordinates.nrows())
            .into_par_iter()
            .map(|i| {
                let target = coordinates.row(i).subcols(0, 3);
                self.coefficients
                    .iter()
                    .enumerate()
                    .map(|(j, c)| c * kernel_value(target, self.sources.row(j), self.kernel))
                    .sum::<f64>()
            })
            .collect::<Vec<_>>();

        crate::error::ensure_finite("equivalent source prediction", predicted.iter())?;
        Ok(predicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_config::SourceKernel;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 4 x 4 stations 1 km apart at slightly uneven heights.
    fn stations() -> Mat<f64> {
        let mut rng = StdRng::seed_from_u64(42);
        Mat::from_fn(16, 3, |i, j| match j {
            0 => (i % 4) as f64 * 1000.0,
            1 => (i / 4) as f64 * 1000.0,
            _ => 100.0 + rng.random_range(0.0..20.0),
        })
    }

    #[test]
    fn undamped_fit_recovers_field_from_same_geometry() {
        let coords = stations();
        let es = EquivalentSources::new(EquivalentSourceSettings::builder().depth(1000.0).build());
        let sources = es.source_locations(&coords);

        let mut rng = StdRng::seed_from_u64(7);
        let truth = (0..16).map(|_| rng.random_range(-1e5..1e5)).collect::<Vec<_>>();
        let jac = get_a_matrix(&coords, &sources, KernelType::InverseDistance);
        let data = (0..16)
            .map(|i| (0..16).map(|j| jac[(i, j)] * truth[j]).sum::<f64>())
            .collect::<Vec<_>>();

        let model = es.fit(&coords, &data).unwrap();
        let predicted = model.predict(&coords).unwrap();

        let scale = data.iter().fold(0.0f64, |a, b| a.max(b.abs()));
        for (p, d) in predicted.iter().zip(data.iter()) {
            assert!((p - d).abs() < 1e-8 * scale, "{p} vs {d}");
        }
        assert!(model.summary().rms_misfit < 1e-8 * scale);
        assert_eq!(model.summary().num_sources, 16);
    }

    #[test]
    fn point_mass_kernel_reproduces_buried_mass() {
        let coords = stations();
        let es = EquivalentSources::new(
            EquivalentSourceSettings::builder()
                .depth(1500.0)
                .kernel(SourceKernel::PointMassGz)
                .build(),
        );
        let sources = es.source_locations(&coords);
        let jac = get_a_matrix(&coords, &sources, KernelType::PointMassGz);
        let data = (0..16).map(|i| jac[(i, 5)] * 1e9).collect::<Vec<_>>();

        let model = es.fit(&coords, &data).unwrap();
        assert!((model.coefficients()[5] - 1e9).abs() < 1e-3 * 1e9);
    }

    #[test]
    fn damping_smooths_the_fit() {
        let coords = stations();
        let data = (0..16).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect::<Vec<_>>();

        let exact = EquivalentSources::new(EquivalentSourceSettings::builder().build())
            .fit(&coords, &data)
            .unwrap();
        let damped = EquivalentSources::new(EquivalentSourceSettings::builder().damping(100.0).build())
            .fit(&coords, &data)
            .unwrap();

        assert!(damped.summary().rms_misfit > exact.summary().rms_misfit);
    }

    #[test]
    fn block_averaged_layout_reduces_sources() {
        let coords = stations();
        let es = EquivalentSources::new(
            EquivalentSourceSettings::builder()
                .depth(500.0)
                .layout(SourceLayout::BlockAveraged { block_size: 2000.0 })
                .build(),
        );
        let sources = es.source_locations(&coords);
        assert_eq!(sources.nrows(), 4);

        // First block holds stations 0, 1, 4 and 5.
        let mut up = [0, 1, 4, 5].map(|i| coords[(i, 2)]);
        up.sort_unstable_by(f64::total_cmp);
        let median_up = 0.5 * (up[1] + up[2]);
        assert!((sources[(0, 0)] - 500.0).abs() < 1e-9);
        assert!((sources[(0, 1)] - 500.0).abs() < 1e-9);
        assert!((sources[(0, 2)] - (median_up - 500.0)).abs() < 1e-9);

        let model = es.fit(&coords, &vec![1.0; 16]).unwrap();
        assert_eq!(model.summary().num_sources, 4);
    }

    #[test]
    fn block_sources_ignore_an_outlying_station() {
        let coords = Mat::from_fn(3, 3, |i, j| match (i, j) {
            (2, 2) => 900.0,
            (_, 2) => 100.0,
            (_, _) => 10.0 * i as f64,
        });
        let es = EquivalentSources::new(
            EquivalentSourceSettings::builder()
                .depth(50.0)
                .layout(SourceLayout::BlockAveraged { block_size: 1000.0 })
                .build(),
        );
        let sources = es.source_locations(&coords);
        assert_eq!(sources.nrows(), 1);
        assert_eq!(sources[(0, 0)], 10.0);
        assert_eq!(sources[(0, 2)], 50.0);
    }

    #[test]
    fn custom_layout_uses_given_positions() {
        let es = EquivalentSources::new(
            EquivalentSourceSettings::builder()
                .layout(SourceLayout::Custom {
                    easting: vec![0.0, 10.0],
                    northing: vec![5.0, 5.0],
                    upward: vec![-100.0, -200.0],
                })
                .build(),
        );
        let sources = es.source_locations(&stations());
        assert_eq!(sources.nrows(), 2);
        assert_eq!(sources[(1, 2)], -200.0);
    }

    #[test]
    fn prediction_needs_three_columns() {
        let coords = stations();
        let model = EquivalentSources::default().fit(&coords, &vec![1.0; 16]).unwrap();
        assert!(model.predict(&Mat::zeros(2, 2)).is_err());
    }
}
