// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Payload shapes carried inside a [`crate::RunRequest`]. Field names are
//! snake_case to match the guest support module exactly; channel lookups
//! use string keys (`"0"`, `"1"`, ...), never integer indices, because the
//! guest's JSON decoder preserves object key order that array indices
//! would not.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A stage position in physical (not pixel) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StagePosition {
    pub x: f64,
    pub y: f64,
}

/// Row-major 2x2 affine matrix mapping pixel offsets to stage-space offsets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelToStageMatrix {
    pub m00: f64,
    pub m01: f64,
    pub m10: f64,
    pub m11: f64,
}

impl PixelToStageMatrix {
    pub fn apply(&self, px: f64, py: f64) -> (f64, f64) {
        (self.m00 * px + self.m01 * py, self.m10 * px + self.m11 * py)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TileCoord {
    pub column: u32,
    pub row: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub index: String,
    pub name: String,
}

/// One tile's metadata, including its image file per channel. Channel keys
/// are the string form of the channel index (`"0"`, `"1"`, ...), never a
/// bare integer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub column: u32,
    pub row: u32,
    pub stage_position: StagePosition,
    pub tile_center_pixel_offset: (f64, f64),
    pub image_file_names: IndexMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceTileSet {
    pub guid: String,
    pub name: String,
    pub data_folder_path: String,
    pub column_count: u32,
    pub row_count: u32,
    pub channel_count: u32,
    pub tile_size: (u32, u32),
    pub tile_resolution: f64,
    pub pixel_format: String,
    pub stage_position: StagePosition,
    pub rotation: f64,
    pub pixel_to_stage_matrix: PixelToStageMatrix,
    #[serde(default)]
    pub overlaps: (f64, f64),
    pub channels: Vec<Channel>,
    pub tiles: Vec<Tile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceImageLayer {
    pub guid: String,
    pub name: String,
    pub stage_position: StagePosition,
    pub rotation: f64,
    pub data_folder_path: String,
    pub size: (u32, u32),
    pub total_layer_resolution: f64,
    pub pixel_to_stage_matrix: PixelToStageMatrix,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_tile_set: Option<SourceTileSet>,
}

/// Mapping of string channel index to an absolute in-container path.
pub type PreparedImages = IndexMap<String, String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matrix_apply_is_linear() {
        let m = PixelToStageMatrix { m00: 2.0, m01: 0.0, m10: 0.0, m11: 2.0 };
        assert_eq!(m.apply(3.0, 4.0), (6.0, 8.0));
    }

    #[test]
    fn tile_channel_keys_are_strings_not_integers() {
        let json = serde_json::json!({
            "column": 0, "row": 0,
            "stage_position": {"x": 0.0, "y": 0.0},
            "tile_center_pixel_offset": [0.0, 0.0],
            "image_file_names": {"0": "c0.tif", "1": "c1.tif"}
        });
        let tile: Tile = serde_json::from_value(json).unwrap();
        assert_eq!(tile.image_file_names.get("0"), Some(&"c0.tif".to_string()));
    }
}
