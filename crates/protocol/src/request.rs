// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `RunRequest` envelope, the single JSON document written to the
//! guest's stdin.

use crate::types::{PreparedImages, SourceImageLayer, SourceTileSet, TileCoord};
use serde::{Deserialize, Serialize};

/// Upper bound on `script_parameters`, enforced by the admission layer
/// before a workspace is ever materialized.
pub const MAX_SCRIPT_PARAMETERS_BYTES: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestType {
    TileSet,
    ImageLayer,
    Generic,
}

impl std::fmt::Display for RequestType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            RequestType::TileSet => "tile_set",
            RequestType::ImageLayer => "image_layer",
            RequestType::Generic => "generic",
        })
    }
}

/// The JSON document delivered on the guest's stdin at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "request_type", rename_all = "snake_case")]
pub enum RunRequest {
    TileSet {
        request_guid: String,
        script_name: String,
        script_parameters: String,
        source_tile_set: SourceTileSet,
        tiles_to_process: Vec<TileCoord>,
    },
    ImageLayer {
        request_guid: String,
        script_name: String,
        script_parameters: String,
        source_image_layer: SourceImageLayer,
        prepared_images: PreparedImages,
    },
    Generic {
        request_guid: String,
        script_name: String,
        script_parameters: String,
    },
}

impl RunRequest {
    pub fn request_type(&self) -> RequestType {
        match self {
            RunRequest::TileSet { .. } => RequestType::TileSet,
            RunRequest::ImageLayer { .. } => RequestType::ImageLayer,
            RunRequest::Generic { .. } => RequestType::Generic,
        }
    }

    pub fn script_parameters(&self) -> &str {
        match self {
            RunRequest::TileSet { script_parameters, .. }
            | RunRequest::ImageLayer { script_parameters, .. }
            | RunRequest::Generic { script_parameters, .. } => script_parameters,
        }
    }

    pub fn request_guid(&self) -> &str {
        match self {
            RunRequest::TileSet { request_guid, .. }
            | RunRequest::ImageLayer { request_guid, .. }
            | RunRequest::Generic { request_guid, .. } => request_guid,
        }
    }

    /// `script_parameters` too large to ship to a guest; the caller should
    /// have rejected this before building a `RunRequest` at all, but the
    /// check lives here too since it is a wire-contract invariant.
    pub fn fits_size_budget(&self) -> bool {
        self.script_parameters().len() <= MAX_SCRIPT_PARAMETERS_BYTES
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PixelToStageMatrix, StagePosition};

    #[test]
    fn tagged_enum_round_trips_tile_set() {
        let request = RunRequest::TileSet {
            request_guid: "g1".into(),
            script_name: "analyze".into(),
            script_parameters: "{}".into(),
            source_tile_set: SourceTileSet {
                guid: "ts1".into(),
                name: "plate-1".into(),
                data_folder_path: "/input".into(),
                column_count: 2,
                row_count: 2,
                channel_count: 1,
                tile_size: (512, 512),
                tile_resolution: 0.5,
                pixel_format: "uint16".into(),
                stage_position: StagePosition { x: 0.0, y: 0.0 },
                rotation: 0.0,
                pixel_to_stage_matrix: PixelToStageMatrix { m00: 1.0, m01: 0.0, m10: 0.0, m11: 1.0 },
                overlaps: (0.1, 0.1),
                channels: vec![],
                tiles: vec![],
            },
            tiles_to_process: vec![TileCoord { column: 0, row: 0 }],
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""request_type":"tile_set""#));
        let back: RunRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_type(), RequestType::TileSet);
    }

    #[test]
    fn generic_request_round_trips() {
        let request = RunRequest::Generic {
            request_guid: "g2".into(),
            script_name: "noop".into(),
            script_parameters: String::new(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: RunRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.request_guid(), "g2");
    }

    #[test]
    fn rejects_oversized_script_parameters() {
        let request = RunRequest::Generic {
            request_guid: "g3".into(),
            script_name: "noop".into(),
            script_parameters: "x".repeat(MAX_SCRIPT_PARAMETERS_BYTES + 1),
        };
        assert!(!request.fits_size_budget());
    }

    #[test]
    fn exactly_at_budget_fits() {
        let request = RunRequest::Generic {
            request_guid: "g4".into(),
            script_name: "noop".into(),
            script_parameters: "x".repeat(MAX_SCRIPT_PARAMETERS_BYTES),
        };
        assert!(request.fits_size_budget());
    }
}
