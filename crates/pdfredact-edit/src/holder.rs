//! Page object holders: pages and forms.
//!
//! A holder owns an ordered list of page objects; iteration order is PDF
//! paint order. Both holder kinds carry a `content_version` counter whose
//! bump stands in for regenerating the holder's content stream (the
//! serializer itself is a collaborator of this crate).

use std::ops::{Deref, DerefMut};

use crate::object::PageObject;

/// An ordered container of page objects.
#[derive(Debug, Clone, Default)]
pub struct PageObjectHolder {
    objects: Vec<PageObject>,
    content_version: u64,
}

impl PageObjectHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an object at the end of the paint order.
    pub fn append_object(&mut self, object: PageObject) {
        self.objects.push(object);
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// The objects in paint order.
    pub fn objects(&self) -> &[PageObject] {
        &self.objects
    }

    pub fn object(&self, index: usize) -> Option<&PageObject> {
        self.objects.get(index)
    }

    pub fn object_mut(&mut self, index: usize) -> Option<&mut PageObject> {
        self.objects.get_mut(index)
    }

    /// Physically remove the objects at `indices`, preserving the order of
    /// the survivors. Indices may arrive in any order; duplicates are
    /// ignored.
    pub fn remove_objects(&mut self, indices: &[usize]) {
        let mut sorted: Vec<usize> = indices.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        for index in sorted.into_iter().rev() {
            if index < self.objects.len() {
                self.objects.remove(index);
            }
        }
    }

    /// The content stream generation counter.
    pub fn content_version(&self) -> u64 {
        self.content_version
    }

    /// Regenerate the holder's content stream from its objects. Observable
    /// here as a version bump; serialization is the content generator's
    /// concern.
    pub fn regenerate_content(&mut self) {
        self.content_version += 1;
    }
}

/// A page: the root holder of one redaction call.
#[derive(Debug, Clone, Default)]
pub struct Page {
    holder: PageObjectHolder,
    render_epoch: u64,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    /// The render cache epoch; bumped whenever cached rendering must be
    /// discarded.
    pub fn render_epoch(&self) -> u64 {
        self.render_epoch
    }

    /// Invalidate any cached rendering of this page.
    pub fn clear_render_cache(&mut self) {
        self.render_epoch += 1;
    }
}

impl Deref for Page {
    type Target = PageObjectHolder;

    fn deref(&self) -> &Self::Target {
        &self.holder
    }
}

impl DerefMut for Page {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.holder
    }
}

/// A form XObject: a reusable holder placed by a placement matrix.
#[derive(Debug, Clone, Default)]
pub struct Form {
    holder: PageObjectHolder,
}

impl Form {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Deref for Form {
    type Target = PageObjectHolder;

    fn deref(&self) -> &Self::Target {
        &self.holder
    }
}

impl DerefMut for Form {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.holder
    }
}
