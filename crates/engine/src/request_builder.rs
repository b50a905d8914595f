// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Builds the `RunRequest` JSON document handed to a guest on stdin.
//!
//! The minimal admission surface here (§4.6) only ever supplies zero or one
//! raw image, never a pre-described tile grid, so `request_type` inference
//! collapses to two cases in practice: `Generic` with no image, `ImageLayer`
//! with one. The `TileSet` variant stays in the wire contract for a richer
//! admission surface this engine does not expose; nothing here constructs
//! one. Recorded as an Open Question resolution in `DESIGN.md`.

use crate::workspace_materializer::staged_image_container_path;
use isolab_core::JobId;
use isolab_protocol::types::{PixelToStageMatrix, SourceImageLayer, StagePosition};
use isolab_protocol::RunRequest;

/// Build the request for a job with no staged image.
pub fn generic(job_id: &JobId, script_parameters: &str) -> RunRequest {
    RunRequest::Generic {
        request_guid: job_id.to_string(),
        script_name: "run".to_string(),
        script_parameters: script_parameters.to_string(),
    }
}

/// Build the request for a job with exactly one staged image. Stage
/// geometry (position, rotation, resolution) is unknown at admission time
/// in this minimal surface, so it is recorded as the identity placement;
/// the guest reads the image's own dimensions off disk rather than
/// trusting `size` for anything beyond a sanity check.
pub fn image_layer(job_id: &JobId, script_parameters: &str) -> RunRequest {
    RunRequest::ImageLayer {
        request_guid: job_id.to_string(),
        script_name: "run".to_string(),
        script_parameters: script_parameters.to_string(),
        source_image_layer: SourceImageLayer {
            guid: job_id.to_string(),
            name: "uploaded".to_string(),
            stage_position: StagePosition { x: 0.0, y: 0.0 },
            rotation: 0.0,
            data_folder_path: "/input".to_string(),
            size: (0, 0),
            total_layer_resolution: 1.0,
            pixel_to_stage_matrix: PixelToStageMatrix { m00: 1.0, m01: 0.0, m10: 0.0, m11: 1.0 },
            original_tile_set: None,
        },
        prepared_images: {
            let mut images = isolab_protocol::types::PreparedImages::new();
            images.insert("0".to_string(), staged_image_container_path());
            images
        },
    }
}

/// Build the request, inferring `request_type` from whether an image was
/// staged for this job.
pub fn build(job_id: &JobId, script_parameters: &str, has_image: bool) -> RunRequest {
    if has_image {
        image_layer(job_id, script_parameters)
    } else {
        generic(job_id, script_parameters)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isolab_protocol::RequestType;

    #[test]
    fn no_image_builds_a_generic_request() {
        let job_id = JobId::new();
        let request = build(&job_id, "{}", false);
        assert_eq!(request.request_type(), RequestType::Generic);
    }

    #[test]
    fn one_image_builds_an_image_layer_request_with_a_prepared_path() {
        let job_id = JobId::new();
        let request = build(&job_id, "{}", true);
        assert_eq!(request.request_type(), RequestType::ImageLayer);
        if let RunRequest::ImageLayer { prepared_images, .. } = request {
            assert_eq!(prepared_images.get("0"), Some(&"/input/input.bin".to_string()));
        } else {
            panic!("expected an ImageLayer request");
        }
    }

    #[test]
    fn request_guid_matches_the_job_id() {
        let job_id = JobId::new();
        let request = build(&job_id, "{}", false);
        assert_eq!(request.request_guid(), job_id.to_string());
    }
}
