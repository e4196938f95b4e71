/// Watched marketplace collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Collection {
    slug: String,
    display_name: String,
}

impl Collection {
    /// Collection with the display name derived from the slug,
    /// e.g. `cool-cats` -> `cool cats`.
    pub fn new(slug: impl Into<String>) -> Self {
        let slug = slug.into();
        let display_name = slug.replace(['-', '_'], " ");
        Self { slug, display_name }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Label used for items lacking a metadata name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }
}
