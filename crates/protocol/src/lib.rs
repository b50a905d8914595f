// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sandbox protocol: the wire contract between the engine and the
//! guest program it runs.
//!
//! Wire format: one JSON `RunRequest` document written to the guest's
//! stdin at startup; the guest talks back over a line-delimited marker
//! protocol on stdout, optionally reading a JSON confirmation reply back
//! off its own stdin for markers that request one.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod confirmation;
pub mod guest_module;
pub mod marker;
pub mod request;
pub mod types;

pub use confirmation::Confirmation;
pub use guest_module::GUEST_SUPPORT_MODULE;
pub use marker::{Marker, MarkerError, MarkerName};
pub use request::{RequestType, RunRequest};
pub use types::{
    Channel, PixelToStageMatrix, PreparedImages, SourceImageLayer, SourceTileSet, StagePosition,
    Tile, TileCoord,
};
