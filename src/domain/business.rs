//! Business record input model.
//!
//! Records arrive from an upstream ingestion/cleaning collaborator; the
//! engine trusts that identifier, name, category, city, and state are
//! non-empty and does not re-validate them.

use serde::{Deserialize, Serialize};

/// Maximum length of a derived slug.
const SLUG_MAX_LEN: usize = 60;

/// A raw business record, immutable input to one loop invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_id: String,
    pub name: String,
    pub category: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u64>,
}

impl BusinessRecord {
    /// Derive the record's own URL slug from name, category, and city.
    ///
    /// Lowercase, hyphen-separated, special characters stripped, capped at
    /// 60 characters without a trailing hyphen.
    pub fn slug(&self) -> String {
        let joined = format!("{}-{}-{}", self.name, self.category, self.city);
        let mut slug = String::with_capacity(joined.len());
        let mut last_hyphen = true; // suppress a leading hyphen

        for c in joined.chars() {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_alphanumeric() {
                slug.push(c);
                last_hyphen = false;
            } else if !last_hyphen {
                slug.push('-');
                last_hyphen = true;
            }
        }

        if slug.len() > SLUG_MAX_LEN {
            slug.truncate(SLUG_MAX_LEN);
        }
        slug.trim_end_matches('-').to_string()
    }
}

/// Select records related to `subject` from a pool, for internal linking.
///
/// Related means same city or same category (case-insensitive), excluding
/// the subject itself, capped at 5.
pub fn related_records<'a>(
    subject: &BusinessRecord,
    pool: &'a [BusinessRecord],
) -> Vec<&'a BusinessRecord> {
    let city = subject.city.to_lowercase();
    let category = subject.category.to_lowercase();

    pool.iter()
        .filter(|other| other.business_id != subject.business_id)
        .filter(|other| {
            other.city.to_lowercase() == city || other.category.to_lowercase() == category
        })
        .take(5)
        .collect()
}
