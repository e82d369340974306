use std::path::{Path, PathBuf};

use image::ImageReader;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainOptions {
    pub width: f32,
    pub depth: f32,
    pub min_height: f32,
    pub max_height: f32,
    pub base_y: f32,
}

impl Default for TerrainOptions {
    fn default() -> Self {
        Self {
            width: 150.0,
            depth: 150.0,
            min_height: 0.0,
            max_height: 10.0,
            base_y: -0.05,
        }
    }
}

#[derive(Debug, Error)]
pub enum HeightmapError {
    #[error("failed to open heightmap {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode heightmap {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("heightmap has {actual} samples, expected {expected}")]
    SampleCount { expected: usize, actual: usize },
    #[error("heightmap must be at least 2x2 pixels, got {width}x{height}")]
    TooSmall { width: u32, height: u32 },
    #[error("terrain extent must be finite and positive")]
    InvalidExtent,
}

/// Terrain height field centred on the origin of the XZ plane.
///
/// Pixel luminance maps linearly onto `min_height..=max_height`. Image rows
/// run against +Z, so the top row of the picture is the far (+Z) edge.
#[derive(Debug, Clone)]
pub struct Heightmap {
    columns: u32,
    rows: u32,
    samples: Vec<f32>,
    options: TerrainOptions,
}

impl Heightmap {
    pub fn load(path: &Path, options: TerrainOptions) -> Result<Self, HeightmapError> {
        let reader = ImageReader::open(path).map_err(|source| HeightmapError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| HeightmapError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        let luma = decoded.to_luma8();
        let (columns, rows) = luma.dimensions();
        Self::from_luma(columns, rows, luma.into_raw(), options)
    }

    pub fn from_luma(
        columns: u32,
        rows: u32,
        luma: Vec<u8>,
        options: TerrainOptions,
    ) -> Result<Self, HeightmapError> {
        if columns < 2 || rows < 2 {
            return Err(HeightmapError::TooSmall {
                width: columns,
                height: rows,
            });
        }
        let expected = columns as usize * rows as usize;
        if luma.len() != expected {
            return Err(HeightmapError::SampleCount {
                expected,
                actual: luma.len(),
            });
        }
        let extent_ok = [options.width, options.depth]
            .iter()
            .all(|extent| extent.is_finite() && *extent > 0.0);
        if !extent_ok || !options.min_height.is_finite() || !options.max_height.is_finite() {
            return Err(HeightmapError::InvalidExtent);
        }

        let samples = luma
            .into_iter()
            .map(|value| value as f32 / 255.0)
            .collect();
        Ok(Self {
            columns,
            rows,
            samples,
            options,
        })
    }

    pub fn options(&self) -> TerrainOptions {
        self.options
    }

    /// World-space surface height at `(x, z)`, or `None` off the terrain.
    pub fn height_at(&self, x: f32, z: f32) -> Option<f32> {
        let (u, v) = self.normalized(x, z)?;
        let px = u * (self.columns - 1) as f32;
        let py = v * (self.rows - 1) as f32;
        let x0 = px.floor() as u32;
        let y0 = py.floor() as u32;
        let x1 = (x0 + 1).min(self.columns - 1);
        let y1 = (y0 + 1).min(self.rows - 1);
        let tx = px - x0 as f32;
        let ty = py - y0 as f32;

        let top = lerp(self.sample(x0, y0), self.sample(x1, y0), tx);
        let bottom = lerp(self.sample(x0, y1), self.sample(x1, y1), tx);
        let level = lerp(top, bottom, ty);

        let TerrainOptions {
            min_height,
            max_height,
            base_y,
            ..
        } = self.options;
        Some(base_y + min_height + level * (max_height - min_height))
    }

    fn normalized(&self, x: f32, z: f32) -> Option<(f32, f32)> {
        let u = (x + self.options.width * 0.5) / self.options.width;
        let v = 1.0 - (z + self.options.depth * 0.5) / self.options.depth;
        ((0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&v)).then_some((u, v))
    }

    fn sample(&self, column: u32, row: u32) -> f32 {
        self.samples[(row * self.columns + column) as usize]
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
