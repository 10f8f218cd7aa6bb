//! Resource loader seam
//!
//! The document engine owns the real fetcher. A [`crate::PolicyFilter`] wraps
//! one and exposes the same `fetch` signature.

use std::sync::Arc;

/// Something that can fetch a sub-resource for a document.
pub trait ResourceLoader {
    /// Per-request options (referrer, accept header, cookie jar, ...).
    /// Passed through the filter untouched.
    type Options;
    /// Handle to the pending or finished fetch.
    type Resource;

    /// Start fetching `url`. `None` means the loader declined the request.
    fn fetch(&self, url: &str, options: &Self::Options) -> Option<Self::Resource>;
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for &L {
    type Options = L::Options;
    type Resource = L::Resource;

    fn fetch(&self, url: &str, options: &Self::Options) -> Option<Self::Resource> {
        (**self).fetch(url, options)
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Box<L> {
    type Options = L::Options;
    type Resource = L::Resource;

    fn fetch(&self, url: &str, options: &Self::Options) -> Option<Self::Resource> {
        (**self).fetch(url, options)
    }
}

impl<L: ResourceLoader + ?Sized> ResourceLoader for Arc<L> {
    type Options = L::Options;
    type Resource = L::Resource;

    fn fetch(&self, url: &str, options: &Self::Options) -> Option<Self::Resource> {
        (**self).fetch(url, options)
    }
}
