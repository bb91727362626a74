use crate::category::Category;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Shown for particles whose category has no content
pub const PLACEHOLDER_TEXT: &str = "...";

/// One short text item, with optional longer detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Thought {
    pub text: String,
    pub detail: Option<String>,
}

impl Thought {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detail: None,
        }
    }

    #[cfg(test)]
    pub fn with_detail(text: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            detail: Some(detail.into()),
        }
    }

    pub fn placeholder() -> Self {
        Self::new(PLACEHOLDER_TEXT)
    }
}

// Either a bare string or `{ "text": ..., "detail": ... }`
#[derive(Deserialize)]
#[serde(untagged)]
enum ThoughtRepr {
    Plain(String),
    Full {
        text: String,
        #[serde(default)]
        detail: Option<String>,
    },
}

impl<'de> Deserialize<'de> for Thought {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match ThoughtRepr::deserialize(deserializer)? {
            ThoughtRepr::Plain(text) => Thought::new(text),
            ThoughtRepr::Full { text, detail } => Thought {
                text,
                // Empty detail strings count as absent
                detail: detail.filter(|d| !d.trim().is_empty()),
            },
        })
    }
}

/// Category -> ordered pool of thoughts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentLibrary {
    #[serde(alias = "blue")]
    pub a: Vec<Thought>,
    #[serde(alias = "purple")]
    pub b: Vec<Thought>,
    #[serde(alias = "cyan")]
    pub c: Vec<Thought>,
}

impl ContentLibrary {
    /// Read a content file. Categories missing from the file are empty pools.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// One item per category, used when no content file loads
    pub fn builtin() -> Self {
        Self {
            a: vec![Thought::new(
                "Understanding comes before creating: the real value of AI is unlocking unstructured knowledge",
            )],
            b: vec![Thought::new(
                "Design trend: in the age of AI, human intent becomes the scarce resource",
            )],
            c: vec![Thought::new("AI is not just a tool but a creative partner")],
        }
    }

    pub fn pool(&self, category: Category) -> &[Thought] {
        match category {
            Category::A => &self.a,
            Category::B => &self.b,
            Category::C => &self.c,
        }
    }

    pub fn pool_len(&self, category: Category) -> usize {
        self.pool(category).len()
    }

    pub fn total(&self) -> usize {
        Category::ALL.iter().map(|c| self.pool_len(*c)).sum()
    }

    /// Item for a particle's content slot; wraps around the pool
    pub fn resolve(&self, category: Category, slot: usize) -> Thought {
        let pool = self.pool(category);
        if pool.is_empty() {
            return Thought::placeholder();
        }
        pool[slot % pool.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_mixed_entry_formats() {
        let json = r#"{
            "blue": ["plain one", { "text": "rich", "detail": "more words" }],
            "c": [{ "text": "no detail" }, { "text": "blank", "detail": "  " }]
        }"#;
        let lib: ContentLibrary = serde_json::from_str(json).unwrap();
        assert_eq!(lib.a[0], Thought::new("plain one"));
        assert_eq!(lib.a[1], Thought::with_detail("rich", "more words"));
        assert!(lib.b.is_empty());
        assert_eq!(lib.c[0].detail, None);
        assert_eq!(lib.c[1].detail, None);
        assert_eq!(lib.total(), 4);
    }

    #[test]
    fn test_resolve_wraps_slot() {
        let lib = ContentLibrary {
            a: vec![Thought::new("x"), Thought::new("y")],
            ..Default::default()
        };
        assert_eq!(lib.resolve(Category::A, 0).text, "x");
        assert_eq!(lib.resolve(Category::A, 3).text, "y");
    }

    #[test]
    fn test_empty_pool_yields_placeholder() {
        let lib = ContentLibrary::default();
        assert_eq!(lib.resolve(Category::B, 7), Thought::placeholder());
        assert_eq!(lib.resolve(Category::B, 7).text, PLACEHOLDER_TEXT);
    }

    #[test]
    fn test_builtin_covers_every_category() {
        let lib = ContentLibrary::builtin();
        for category in Category::ALL {
            assert_eq!(lib.pool_len(category), 1);
        }
    }

    #[test]
    fn test_load_from_file() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), r#"{ "purple": ["hello"] }"#).unwrap();
        let lib = ContentLibrary::load(temp_file.path()).unwrap();
        assert_eq!(lib.resolve(Category::B, 0).text, "hello");
    }

    #[test]
    fn test_load_errors_are_typed() {
        let missing = ContentLibrary::load(Path::new("/nonexistent/thoughts.json"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));

        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "[1, 2").unwrap();
        let bad = ContentLibrary::load(temp_file.path());
        assert!(matches!(bad, Err(ConfigError::Parse(_))));
    }
}
