//! WebAssembly exports for VoxelCut.
//!
//! These functions are exposed to JavaScript via wasm-bindgen.
//!
//! Volumes and masks travel as flat arrays in `x, y, z` order with z
//! varying fastest, together with their three dimensions.

use wasm_bindgen::prelude::*;

use crate::growing::RegionGrower;
use crate::pipeline::{SegmentParams, SegmentationPipeline};
use crate::volume::{LabelMask, VoxelGrid};

fn load(data: &[f32], seeds: &[u8], dims: (usize, usize, usize)) -> Result<(VoxelGrid, LabelMask), JsValue> {
    let volume = VoxelGrid::from_shape_vec(dims, data.to_vec()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let seeds = LabelMask::from_shape_vec(dims, seeds.to_vec()).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok((volume, seeds))
}

// ============================================================================
// Segmentation
// ============================================================================

/// Segment a volume from a seed mask.
///
/// # Arguments
/// * `data` - Flat intensities (length = dx * dy * dz)
/// * `seeds` - Flat seed mask of the same length, non-zero marks a seed
/// * `compensate` - Margin around the intensity bands
///
/// # Returns
/// Flat refined mask with values 0/1
#[wasm_bindgen]
pub fn segment_volume_wasm(
    data: &[f32],
    seeds: &[u8],
    dx: usize,
    dy: usize,
    dz: usize,
    compensate: f32,
) -> Result<Vec<u8>, JsValue> {
    let (volume, seeds) = load(data, seeds, (dx, dy, dz))?;
    let params = SegmentParams::default().with_compensate(compensate);
    let result = SegmentationPipeline::new(params)
        .run(&volume, &seeds)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(result.mask.into_array().into_raw_vec_and_offset().0)
}

// ============================================================================
// Region growing
// ============================================================================

/// Grow a region without slice refinement.
///
/// # Returns
/// Flat grown mask with values 0/1
#[wasm_bindgen]
pub fn grow_region_wasm(
    data: &[f32],
    seeds: &[u8],
    dx: usize,
    dy: usize,
    dz: usize,
    compensate: f32,
) -> Result<Vec<u8>, JsValue> {
    let (volume, seeds) = load(data, seeds, (dx, dy, dz))?;
    SegmentParams::default()
        .with_compensate(compensate)
        .validate()
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    let grown = RegionGrower::new(compensate)
        .grow(&volume, &seeds)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(grown.mask.into_array().into_raw_vec_and_offset().0)
}
