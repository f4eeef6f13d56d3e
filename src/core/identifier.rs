//! Flexible record identifiers
//!
//! A single path segment addresses a record either by its opaque id or by a
//! tag expression `tag.<field>:<value>`:
//!
//! ```text
//! GET /flights/3f2b6c1e-...            -> id lookup
//! GET /flights/tag.customId:LH400_0312 -> lookup on the customId tag
//! ```

use crate::core::error::IdentifierError;
use crate::core::filter::predicate::Predicate;
use crate::core::filter::registry::FilterRegistry;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Store field of the opaque record id
pub const ID_FIELD: &str = "id";

fn tag_pattern() -> &'static Regex {
    static TAG_REGEX: OnceLock<Regex> = OnceLock::new();
    TAG_REGEX.get_or_init(|| {
        // ASCII only; `\w` would admit any Unicode letter
        Regex::new(r"^tag\.([A-Za-z0-9_]+):([A-Za-z0-9_]+)$")
            .expect("tag identifier pattern is a valid regex")
    })
}

/// How a token addresses its record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Opaque id, not validated; a malformed id simply matches nothing
    ById { id: String },

    /// `tag.<name>:<value>` resolved to the store field behind `name`
    ByTag {
        name: String,
        field: String,
        value: String,
    },
}

impl Lookup {
    /// The equality predicate selecting the record (tenant scope not included)
    pub fn predicate(&self) -> Predicate {
        match self {
            Lookup::ById { id } => Predicate::eq(ID_FIELD, id.as_str()),
            Lookup::ByTag { field, value, .. } => Predicate::eq(field.as_str(), value.as_str()),
        }
    }

    pub fn is_tag(&self) -> bool {
        matches!(self, Lookup::ByTag { .. })
    }
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lookup::ById { id } => write!(f, "id {}", id),
            Lookup::ByTag { name, value, .. } => write!(f, "tag {}={}", name, value),
        }
    }
}

/// Classifies path tokens against an entity's tag allow-list
pub struct IdentifierResolver<'a> {
    registry: &'a FilterRegistry,
}

impl<'a> IdentifierResolver<'a> {
    pub fn new(registry: &'a FilterRegistry) -> Self {
        Self { registry }
    }

    /// Resolve a token
    ///
    /// Anything that does not match the tag grammar is treated as an id, so
    /// parsing never fails. Only a well-formed tag naming a field outside the
    /// allow-list is an error.
    pub fn resolve(&self, token: &str) -> Result<Lookup, IdentifierError> {
        let Some(captures) = tag_pattern().captures(token) else {
            return Ok(Lookup::ById {
                id: token.to_string(),
            });
        };

        let name = &captures[1];
        let value = &captures[2];

        match self.registry.tag(name) {
            Some(tag) => Ok(Lookup::ByTag {
                name: name.to_string(),
                field: tag.field.clone(),
                value: tag.lookup_value(value),
            }),
            None => {
                tracing::warn!(
                    entity = self.registry.entity(),
                    tag = name,
                    "rejected identifier with unknown tag"
                );
                Err(IdentifierError::UnknownTag {
                    field: name.to_string(),
                })
            }
        }
    }
}
