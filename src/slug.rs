//! Filesystem-safe slugs and per-run collision handling

use crate::error::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;
use tracing::warn;

static SEPARATOR_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\-]+").expect("Invalid regex pattern"));

/// Turn a human-readable title or name into a lowercase `[a-z0-9-]` slug.
///
/// Common Latin diacritics and currency/operator symbols are transliterated
/// in place (`R&D` becomes `randd`). Runs of whitespace and `-` become a
/// single `-`; everything else, `_` included, is dropped.
pub fn slugify(text: &str) -> String {
    let mut ascii = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() || c.is_whitespace() || c == '-' {
            ascii.push(c);
        } else if let Some(replacement) = transliterate(c) {
            ascii.push_str(replacement);
        }
    }

    let lower = ascii.to_lowercase();
    SEPARATOR_RUNS
        .replace_all(lower.trim(), "-")
        .trim_matches('-')
        .to_string()
}

fn transliterate(c: char) -> Option<&'static str> {
    let replacement = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'À' | 'Á' | 'Â' | 'Ã' | 'Ä' | 'Å' | 'Ā' | 'Ă' | 'Ą' => "A",
        'æ' => "ae",
        'Æ' => "AE",
        'ç' | 'ć' | 'č' => "c",
        'Ç' | 'Ć' | 'Č' => "C",
        'ď' | 'đ' => "d",
        'Ď' | 'Đ' => "D",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ę' | 'ě' => "e",
        'È' | 'É' | 'Ê' | 'Ë' | 'Ē' | 'Ę' | 'Ě' => "E",
        'ğ' => "g",
        'Ğ' => "G",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'Ì' | 'Í' | 'Î' | 'Ï' | 'Ī' | 'İ' => "I",
        'ł' | 'ľ' => "l",
        'Ł' | 'Ľ' => "L",
        'ñ' | 'ń' | 'ň' => "n",
        'Ñ' | 'Ń' | 'Ň' => "N",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'Ò' | 'Ó' | 'Ô' | 'Õ' | 'Ö' | 'Ø' | 'Ō' | 'Ő' => "O",
        'œ' => "oe",
        'Œ' => "OE",
        'ř' => "r",
        'Ř' => "R",
        'ś' | 'š' | 'ş' => "s",
        'Ś' | 'Š' | 'Ş' => "S",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'Ť' | 'Ţ' => "T",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'Ù' | 'Ú' | 'Û' | 'Ü' | 'Ū' | 'Ů' | 'Ű' => "U",
        'ý' | 'ÿ' => "y",
        'Ý' | 'Ÿ' => "Y",
        'ź' | 'ż' | 'ž' => "z",
        'Ź' | 'Ż' | 'Ž' => "Z",
        '&' => "and",
        '|' => "or",
        '<' => "less",
        '>' => "greater",
        '$' => "dollar",
        '%' => "percent",
        '€' => "euro",
        '£' => "pound",
        '¥' => "yen",
        '¢' => "cent",
        '™' => "tm",
        _ => return None,
    };
    Some(replacement)
}

/// What to do when two entities produce the same slug
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Disambiguate the later entity with its source id.
    #[default]
    Suffix,
    /// Abort the run.
    Fail,
}

impl FromStr for CollisionPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "suffix" => Ok(Self::Suffix),
            "fail" => Ok(Self::Fail),
            other => Err(format!(
                "unknown slug collision policy '{other}' (expected 'suffix' or 'fail')"
            )),
        }
    }
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Suffix => f.write_str("suffix"),
            Self::Fail => f.write_str("fail"),
        }
    }
}

#[derive(Debug)]
struct Assignment {
    slug: String,
    label: String,
}

/// Slug assignments for one output directory
#[derive(Debug)]
pub struct SlugRegistry {
    namespace: &'static str,
    policy: CollisionPolicy,
    /// slug -> id of the entity that owns it
    taken: HashMap<String, String>,
    /// id -> assigned slug and the label it was derived from
    assigned: HashMap<String, Assignment>,
    renamed: usize,
}

impl SlugRegistry {
    pub fn new(namespace: &'static str, policy: CollisionPolicy) -> Self {
        Self {
            namespace,
            policy,
            taken: HashMap::new(),
            assigned: HashMap::new(),
            renamed: 0,
        }
    }

    /// Assign a slug to entity `id` derived from `label`.
    ///
    /// Registering the same id twice returns the slug it already holds, so a
    /// duplicated record overwrites the earlier page.
    pub fn register(&mut self, id: &str, label: &str) -> Result<String> {
        if let Some(existing) = self.assigned.get(id) {
            if existing.label != label {
                warn!(
                    "{} id '{}' appears twice ('{}' and '{}'), both are written as '{}'",
                    self.namespace, id, existing.label, label, existing.slug
                );
            }
            return Ok(existing.slug.clone());
        }

        let id_slug = slugify(id);
        let mut slug = slugify(label);
        if slug.is_empty() {
            slug = id_slug.clone();
        }

        if let Some(owner) = self.taken.get(&slug) {
            match self.policy {
                CollisionPolicy::Fail => {
                    return Err(Error::SlugCollision {
                        namespace: self.namespace,
                        slug,
                        first: owner.clone(),
                        second: id.to_string(),
                    });
                }
                CollisionPolicy::Suffix => {
                    let base = if id_slug.is_empty() || id_slug == slug {
                        slug.clone()
                    } else {
                        format!("{slug}-{id_slug}")
                    };
                    let mut candidate = base.clone();
                    let mut counter = 2;
                    while self.taken.contains_key(&candidate) {
                        candidate = format!("{base}-{counter}");
                        counter += 1;
                    }
                    warn!(
                        "{} slug '{}' already used by '{}', writing '{}' as '{}'",
                        self.namespace, slug, owner, id, candidate
                    );
                    self.renamed += 1;
                    slug = candidate;
                }
            }
        }

        self.taken.insert(slug.clone(), id.to_string());
        self.assigned.insert(
            id.to_string(),
            Assignment {
                slug: slug.clone(),
                label: label.to_string(),
            },
        );
        Ok(slug)
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        self.assigned.get(id).map(|a| a.slug.as_str())
    }

    /// Number of entities that were given a disambiguated slug.
    pub fn renamed(&self) -> usize {
        self.renamed
    }
}
