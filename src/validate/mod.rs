//! Validation of generated content.
//!
//! Two layers, always in this order: the schema validator parses raw model
//! output into a structurally valid [`ContentSpec`](crate::domain::ContentSpec),
//! then the SEO rule validator checks the parsed spec against domain rules.
//! SEO rules never run on structurally invalid output.

mod schema;
mod seo;

pub use schema::{ParseOutcome, parse_content_spec};
pub use seo::SeoValidator;
