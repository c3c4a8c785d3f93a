//! Prompt construction for generation and repair rounds.
//!
//! Prompts are pure functions of their inputs: identical (record, prior
//! attempt, violations) always yields byte-identical text. No timestamps,
//! no randomness. This keeps traces reproducible and the builder trivially
//! testable.

use crate::config::SeoThresholds;
use crate::domain::{AttemptRecord, BusinessRecord, Violation};

/// System prompt accompanying every generation call.
pub const SYSTEM_PROMPT: &str = "You are an expert SEO content writer specializing in local business pages.\n\
You must respond with a single valid JSON object matching the requested shape exactly.\n\
Do not include any text outside the JSON response.";

/// Builds initial and repair prompts from a business record.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    thresholds: SeoThresholds,
    link_candidates: Vec<String>,
}

impl PromptBuilder {
    pub fn new(thresholds: &SeoThresholds) -> Self {
        Self {
            thresholds: thresholds.clone(),
            link_candidates: Vec::new(),
        }
    }

    /// Slugs of related pages offered to the model for internal linking.
    pub fn with_link_candidates(mut self, candidates: Vec<String>) -> Self {
        self.link_candidates = candidates;
        self
    }

    /// Build the prompt for a round.
    ///
    /// With no prior attempt this is the initial generation prompt; with one
    /// it becomes a repair prompt embedding the prior output verbatim and
    /// the enumerated violations, demanding a corrected full replacement.
    pub fn build(
        &self,
        record: &BusinessRecord,
        prior: Option<&AttemptRecord>,
        violations: &[Violation],
    ) -> String {
        let mut prompt = self.initial_prompt(record);

        if let Some(prior) = prior {
            prompt.push_str("\n\nYOUR PREVIOUS RESPONSE:\n");
            prompt.push_str(&prior.raw_output);
            prompt.push_str("\n\nPROBLEMS FOUND IN THE PREVIOUS RESPONSE:\n");
            for (idx, violation) in violations.iter().enumerate() {
                prompt.push_str(&format!(
                    "{}. [{}] {}\n",
                    idx + 1,
                    violation.rule,
                    violation.message
                ));
            }
            prompt.push_str(
                "\nFix every problem listed above and return the complete corrected JSON \
                 object. Return the FULL page specification, not just the changed fields.",
            );
        }

        prompt
    }

    fn initial_prompt(&self, record: &BusinessRecord) -> String {
        let t = &self.thresholds;

        let mut prompt = format!(
            "Create a complete SEO page specification for this local business:\n\
             \n\
             BUSINESS DETAILS:\n\
             - Name: {name}\n\
             - Category: {category}\n\
             - Address: {address}, {city}, {state} {zip}\n\
             - Phone: {phone}\n\
             - Website: {website}\n\
             - Email: {email}\n\
             - Description: {description}\n\
             - Rating: {rating}\n\
             - Reviews: {reviews}\n",
            name = record.name,
            category = record.category,
            address = record.address,
            city = record.city,
            state = record.state,
            zip = record.zip_code,
            phone = optional(&record.phone),
            website = optional(&record.website),
            email = optional(&record.email),
            description = optional(&record.description),
            rating = record
                .rating
                .map(|r| format!("{:.1}/5.0", r))
                .unwrap_or_else(|| "Not provided".to_string()),
            reviews = record
                .review_count
                .map(|c| format!("{} reviews", c))
                .unwrap_or_else(|| "Not provided".to_string()),
        );

        if !self.link_candidates.is_empty() {
            prompt.push_str("\nRELATED PAGES FOR INTERNAL LINKING (use these slugs):\n");
            for slug in &self.link_candidates {
                prompt.push_str(&format!("- {}\n", slug));
            }
        }

        prompt.push_str(&format!(
            "\nREQUIREMENTS:\n\
             1. title: {title_min}-{title_max} characters, SEO-optimized\n\
             2. meta_description: {meta_min}-{meta_max} characters\n\
             3. heading: engaging main heading, at most {heading_max} characters\n\
             4. slug: URL-friendly (lowercase letters, digits, hyphens), at most {slug_max} characters\n\
             5. body: {body_min}-{body_max} words covering the business overview, services, \
             location and service area, and customer experience\n\
             6. keywords: at least {keywords_min} distinct local SEO keywords\n\
             7. jsonld: schema.org LocalBusiness markup with @type, name, a nested address \
             object, and contact details\n\
             8. internal_links: {links_min}-{links_max} distinct slugs of related pages, never \
             this page's own slug\n\
             \n\
             CONTENT GUIDELINES:\n\
             - Write for local customers searching for {category} services in {city}\n\
             - Use natural, engaging language, not overly promotional\n\
             - Keep all facts generic but plausible for this business type\n\
             \n\
             Return a single JSON object with exactly these keys:\n\
             {{\"title\", \"meta_description\", \"heading\", \"slug\", \"body\", \"keywords\", \
             \"jsonld\", \"internal_links\"}}",
            title_min = t.title_min,
            title_max = t.title_max,
            meta_min = t.meta_min,
            meta_max = t.meta_max,
            heading_max = t.heading_max,
            slug_max = t.slug_max,
            body_min = t.body_min_words,
            body_max = t.body_max_words,
            keywords_min = t.keywords_min,
            links_min = t.links_min,
            links_max = t.links_max,
            category = record.category,
            city = record.city,
        ));

        prompt
    }
}

fn optional(field: &Option<String>) -> &str {
    field.as_deref().unwrap_or("Not provided")
}
