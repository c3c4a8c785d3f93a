//! The schema-governed content artifact.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A complete page specification for one business record.
///
/// Instances are only produced by the schema validator from raw model
/// output; a repair round always yields a new, fully-replaced instance.
/// An accepted ContentSpec has passed every structural and SEO rule, so
/// downstream renderers need not re-validate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentSpec {
    /// Page title.
    pub title: String,

    /// Meta description for search snippets.
    pub meta_description: String,

    /// Main page heading.
    pub heading: String,

    /// URL-friendly slug for this page.
    pub slug: String,

    /// Main body copy.
    pub body: String,

    /// SEO keywords.
    pub keywords: Vec<String>,

    /// schema.org LocalBusiness structured-data block.
    pub jsonld: Map<String, Value>,

    /// Slugs of internally linked pages.
    pub internal_links: Vec<String>,
}

impl ContentSpec {
    /// Whitespace-separated word count of the body.
    pub fn body_word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }
}
