// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The guest-side Python support module, embedded as a build-time asset.
//!
//! The guest interpreter is Python, not Rust; rather than maintain a second
//! hand-written copy of the wire contract that can silently drift from the
//! Rust-side types in this crate, the module is versioned here as a single
//! text asset and shipped into every workspace's `code/` directory
//! alongside the guest's own source so `import isolab_support` just works.

/// The guest support module's source, embedded verbatim.
pub const GUEST_SUPPORT_MODULE: &str = include_str!("../assets/guest_support.py");

/// Filename the module is materialized under in a job's `code/` directory.
pub const GUEST_SUPPORT_MODULE_FILENAME: &str = "isolab_support.py";
