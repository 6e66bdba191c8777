/////////////////////////////////////////////////////////////////////////////////////////////
//
// Reads observation tables and rasters from CSV and writes processed results back to CSV.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! CSV input and output.
//!
//! Observations are read from a headed CSV holding at least the columns
//! `longitude, latitude, height_sea_level_m, gravity_mgal` (in any order; other
//! columns are ignored). Rasters use the unravelled grid layout
//! `longitude, latitude, <value>`, one row per node.

use csv::{ReaderBuilder, StringRecord, Writer};
use std::fs::File;
use std::path::Path;

use crate::error::{PipelineError, Result};
use crate::grid::OutputGrid;
use crate::observations::{ObservationTable, columns};
use crate::raster::{CoordinateKind, Raster};

/// Reads the named columns of a headed CSV file as floats.
fn read_columns(path: &Path, names: &[&str]) -> Result<Vec<Vec<f64>>> {
    let file = File::open(path).map_err(|e| PipelineError::Open {
        path: path.to_path_buf(),
        source: e,
    })?;
    let mut reader = ReaderBuilder::new().has_headers(true).trim(csv::Trim::All).from_reader(file);

    let csv_error = |e| PipelineError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    let headers = reader.headers().map_err(csv_error)?.clone();
    let indices = names
        .iter()
        .map(|name| {
            headers
                .iter()
                .position(|h| h == *name)
                .ok_or_else(|| PipelineError::MissingColumn {
                    column: name.to_string(),
                })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut columns = vec![Vec::new(); names.len()];
    let mut record = StringRecord::new();

    while reader.read_record(&mut record).map_err(csv_error)? {
        let line = record.position().map(|p| p.line() as usize).unwrap_or(0);
        for (c, &idx) in indices.iter().enumerate() {
            let field = record.get(idx).unwrap_or("");
            let value = field.parse::<f64>().map_err(|e| PipelineError::ParseFloat {
                path: path.to_path_buf(),
                line,
                field: field.to_string(),
                source: e,
            })?;
            columns[c].push(value);
        }
    }

    Ok(columns)
}

/// Loads point observations from a headed CSV file.
pub fn read_observations_csv<P: AsRef<Path>>(path: P) -> Result<ObservationTable> {
    let mut cols = read_columns(path.as_ref(), &columns::BASE)?.into_iter();
    let mut next = || cols.next().unwrap_or_default();
    let (lon, lat, height, gravity) = (next(), next(), next(), next());
    ObservationTable::new(lon, lat, height, gravity)
}

/// Loads a geographic raster from a `longitude, latitude, <value_column>` table.
///
/// Every node of the implied grid must be present.
pub fn read_raster_csv<P: AsRef<Path>>(path: P, value_column: &str) -> Result<Raster> {
    let cols = read_columns(path.as_ref(), &[columns::LONGITUDE, columns::LATITUDE, value_column])?;
    Raster::from_table(value_column, CoordinateKind::Geographic, &cols[0], &cols[1], &cols[2])
}

fn create_writer(path: &Path) -> Result<Writer<File>> {
    let file = File::create(path).map_err(|e| PipelineError::Create {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(Writer::from_writer(file))
}

fn write_rows<I>(path: &Path, header: &[String], rows: I) -> Result<()>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = create_writer(path)?;
    let csv_error = |e| PipelineError::Csv {
        path: path.to_path_buf(),
        source: e,
    };

    writer.write_record(header).map_err(csv_error)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_error)?;
    }
    writer.flush().map_err(|e| PipelineError::Create {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Writes every column of the table, preceded by the original row index.
pub fn write_observations_csv<P: AsRef<Path>>(table: &ObservationTable, path: P) -> Result<()> {
    let header = std::iter::once("original_index".to_string())
        .chain(table.column_names().map(str::to_string))
        .collect::<Vec<_>>();
    let cols = table.iter().map(|(_, values)| values).collect::<Vec<_>>();

    let rows = (0..table.len()).map(|i| {
        std::iter::once(table.original_indices()[i].to_string())
            .chain(cols.iter().map(|c| c[i].to_string()))
            .collect::<Vec<_>>()
    });

    write_rows(path.as_ref(), &header, rows)
}

/// Writes an output grid as `longitude, latitude, <name>` rows.
pub fn write_grid_csv<P: AsRef<Path>>(grid: &OutputGrid, path: P) -> Result<()> {
    let header = [
        columns::LONGITUDE.to_string(),
        columns::LATITUDE.to_string(),
        grid.name.clone(),
    ];
    let rows = grid
        .to_table()
        .into_iter()
        .map(|row| row.iter().map(f64::to_string).collect::<Vec<_>>());
    write_rows(path.as_ref(), &header, rows)
}

/// Writes a raster as `x, y, <name>` rows, with `x` varying fastest.
pub fn write_raster_csv<P: AsRef<Path>>(raster: &Raster, path: P) -> Result<()> {
    let (x_name, y_name) = match raster.kind {
        CoordinateKind::Geographic => (columns::LONGITUDE, columns::LATITUDE),
        CoordinateKind::Projected => (columns::EASTING, columns::NORTHING),
    };
    let header = [x_name.to_string(), y_name.to_string(), raster.name.clone()];
    let (coords, values) = raster.to_table();
    let rows = (0..values.len()).map(|k| {
        vec![
            coords[(k, 0)].to_string(),
            coords[(k, 1)].to_string(),
            values[k].to_string(),
        ]
    });
    write_rows(path.as_ref(), &header, rows)
}
