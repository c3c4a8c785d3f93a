//! SEO rule validation.
//!
//! Every rule is independent and all of them run on each pass, so a single
//! round surfaces every problem at once. Each failed rule yields exactly one
//! violation whose message carries the measured value and the bound, making
//! it directly usable in a repair prompt.

use std::collections::HashSet;

use crate::config::SeoThresholds;
use crate::domain::{ContentSpec, RuleId, Violation};

/// Keys every LocalBusiness structured-data block must carry.
const JSONLD_REQUIRED_KEYS: [&str; 3] = ["@type", "name", "address"];

/// Fields of which at least one must be present for contact/geo coverage.
const JSONLD_CONTACT_KEYS: [&str; 4] = ["telephone", "email", "url", "geo"];

/// Validates a structurally valid ContentSpec against SEO rules.
#[derive(Debug, Clone)]
pub struct SeoValidator {
    thresholds: SeoThresholds,
}

impl SeoValidator {
    pub fn new(thresholds: &SeoThresholds) -> Self {
        Self {
            thresholds: thresholds.clone(),
        }
    }

    /// Run all rules in a fixed order; the returned list is empty when the
    /// spec is compliant.
    pub fn validate(&self, spec: &ContentSpec, subject_slug: &str) -> Vec<Violation> {
        let mut violations = Vec::new();

        self.check_title(spec, &mut violations);
        self.check_meta(spec, &mut violations);
        self.check_heading(spec, &mut violations);
        self.check_slug(spec, &mut violations);
        self.check_body(spec, &mut violations);
        self.check_keywords(spec, &mut violations);
        self.check_jsonld(spec, &mut violations);
        self.check_links(spec, subject_slug, &mut violations);

        violations
    }

    fn check_title(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        let len = spec.title.chars().count();
        if len < self.thresholds.title_min || len > self.thresholds.title_max {
            violations.push(Violation::new(
                RuleId::TitleLength,
                "title",
                format!(
                    "title is {} characters, required between {} and {}",
                    len, self.thresholds.title_min, self.thresholds.title_max
                ),
            ));
        }
    }

    fn check_meta(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        let len = spec.meta_description.chars().count();
        if len < self.thresholds.meta_min || len > self.thresholds.meta_max {
            violations.push(Violation::new(
                RuleId::MetaLength,
                "meta_description",
                format!(
                    "meta description is {} characters, required between {} and {}",
                    len, self.thresholds.meta_min, self.thresholds.meta_max
                ),
            ));
        }
    }

    fn check_heading(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        let len = spec.heading.chars().count();
        if len > self.thresholds.heading_max {
            violations.push(Violation::new(
                RuleId::HeadingLength,
                "heading",
                format!(
                    "heading is {} characters, maximum is {}",
                    len, self.thresholds.heading_max
                ),
            ));
        }
    }

    fn check_slug(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        let well_formed = !spec.slug.is_empty()
            && spec
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

        if !well_formed {
            violations.push(Violation::new(
                RuleId::SlugFormat,
                "slug",
                format!(
                    "slug \"{}\" must contain only lowercase letters, digits, and hyphens",
                    spec.slug
                ),
            ));
        } else if spec.slug.len() > self.thresholds.slug_max {
            violations.push(Violation::new(
                RuleId::SlugFormat,
                "slug",
                format!(
                    "slug is {} characters, maximum is {}",
                    spec.slug.len(),
                    self.thresholds.slug_max
                ),
            ));
        }
    }

    fn check_body(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        let words = spec.body_word_count();
        if words < self.thresholds.body_min_words {
            violations.push(Violation::new(
                RuleId::BodyWordCount,
                "body",
                format!(
                    "body has {} words, minimum is {}",
                    words, self.thresholds.body_min_words
                ),
            ));
        } else if words > self.thresholds.body_max_words {
            violations.push(Violation::new(
                RuleId::BodyWordCount,
                "body",
                format!(
                    "body has {} words, maximum is {}",
                    words, self.thresholds.body_max_words
                ),
            ));
        }
    }

    fn check_keywords(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        if spec.keywords.len() < self.thresholds.keywords_min {
            violations.push(Violation::new(
                RuleId::KeywordCount,
                "keywords",
                format!(
                    "page has {} keywords, minimum is {}",
                    spec.keywords.len(),
                    self.thresholds.keywords_min
                ),
            ));
        }

        let duplicates = find_duplicates(&spec.keywords);
        if !duplicates.is_empty() {
            violations.push(Violation::new(
                RuleId::KeywordDuplicate,
                "keywords",
                format!("duplicate keywords: {}", duplicates.join(", ")),
            ));
        }
    }

    fn check_jsonld(&self, spec: &ContentSpec, violations: &mut Vec<Violation>) {
        for key in JSONLD_REQUIRED_KEYS {
            match spec.jsonld.get(key) {
                None => violations.push(Violation::new(
                    RuleId::JsonldKey,
                    format!("jsonld.{}", key),
                    format!("structured data missing required key: {}", key),
                )),
                Some(value) if key == "address" && !value.is_object() => {
                    violations.push(Violation::new(
                        RuleId::JsonldKey,
                        "jsonld.address",
                        "structured data key address must be a nested object",
                    ));
                }
                Some(_) => {}
            }
        }

        let has_contact = JSONLD_CONTACT_KEYS
            .iter()
            .any(|key| spec.jsonld.contains_key(*key));
        if !has_contact {
            violations.push(Violation::new(
                RuleId::JsonldContact,
                "jsonld",
                format!(
                    "structured data must include at least one of: {}",
                    JSONLD_CONTACT_KEYS.join(", ")
                ),
            ));
        }
    }

    fn check_links(&self, spec: &ContentSpec, subject_slug: &str, violations: &mut Vec<Violation>) {
        let count = spec.internal_links.len();
        if count < self.thresholds.links_min || count > self.thresholds.links_max {
            violations.push(Violation::new(
                RuleId::LinkCount,
                "internal_links",
                format!(
                    "page has {} internal links, required between {} and {}",
                    count, self.thresholds.links_min, self.thresholds.links_max
                ),
            ));
        }

        let duplicates = find_duplicates(&spec.internal_links);
        if !duplicates.is_empty() {
            violations.push(Violation::new(
                RuleId::LinkDuplicate,
                "internal_links",
                format!("duplicate internal links: {}", duplicates.join(", ")),
            ));
        }

        if spec.internal_links.iter().any(|link| link == subject_slug) {
            violations.push(Violation::new(
                RuleId::LinkSelf,
                "internal_links",
                format!(
                    "internal links must not reference the page's own slug \"{}\"",
                    subject_slug
                ),
            ));
        }
    }
}

/// Values that appear more than once, in first-seen order, listed once each.
fn find_duplicates(values: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    let mut duplicates = Vec::new();

    for value in values {
        if !seen.insert(value.as_str()) && reported.insert(value.as_str()) {
            duplicates.push(value.clone());
        }
    }

    duplicates
}
