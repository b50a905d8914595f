// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Library image resolution (§4.6 input resolution order, step 2).
//!
//! The real library is a separate collaborator, out of scope here. This
//! trait lets the admission code path (resolution order, fallback to
//! "no image") be exercised without a network dependency.

use parking_lot::Mutex;
use std::collections::HashMap;

pub trait ImageLibrary: Send + Sync + 'static {
    /// Resolve a library reference to raw image bytes, if known.
    fn resolve(&self, image_ref: &str) -> Option<Vec<u8>>;
}

/// In-memory stand-in for the real library service.
#[derive(Default)]
pub struct InMemoryImageLibrary {
    images: Mutex<HashMap<String, Vec<u8>>>,
}

impl InMemoryImageLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.images.lock().insert(name.into(), bytes);
    }
}

impl ImageLibrary for InMemoryImageLibrary {
    fn resolve(&self, image_ref: &str) -> Option<Vec<u8>> {
        self.images.lock().get(image_ref).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_a_previously_inserted_image() {
        let library = InMemoryImageLibrary::new();
        library.insert("plate-1", vec![1, 2, 3]);
        assert_eq!(library.resolve("plate-1"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn unknown_reference_resolves_to_none() {
        let library = InMemoryImageLibrary::new();
        assert_eq!(library.resolve("missing"), None);
    }
}
