use rand::Rng;
use serde::{Deserialize, Serialize};

/// Content class a particle represents. Assigned once at creation and never
/// re-derived from rendering attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[serde(alias = "blue")]
    A,
    #[serde(alias = "purple")]
    B,
    #[serde(alias = "cyan")]
    C,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::A, Category::B, Category::C];

    pub fn index(&self) -> usize {
        match self {
            Category::A => 0,
            Category::B => 1,
            Category::C => 2,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Category::A => "A",
            Category::B => "B",
            Category::C => "C",
        }
    }

    /// Descriptive label shown in the terminal panel
    pub fn label(&self) -> &str {
        match self {
            Category::A => "Blue frequency",
            Category::B => "Purple frequency",
            Category::C => "Cyan frequency",
        }
    }
}

/// Set of categories currently allowed into the field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryFilter {
    active: [bool; 3],
}

impl Default for CategoryFilter {
    fn default() -> Self {
        Self { active: [true; 3] }
    }
}

impl CategoryFilter {
    pub fn is_active(&self, category: Category) -> bool {
        self.active[category.index()]
    }

    /// Toggle a category. Refuses to turn off the last active one.
    /// Returns true if the filter changed.
    pub fn toggle(&mut self, category: Category) -> bool {
        let idx = category.index();
        if self.active[idx] && self.active_count() == 1 {
            return false;
        }
        self.active[idx] = !self.active[idx];
        true
    }

    pub fn active_count(&self) -> usize {
        self.active.iter().filter(|a| **a).count()
    }

    pub fn active(&self) -> impl Iterator<Item = Category> + '_ {
        Category::ALL.into_iter().filter(|c| self.is_active(*c))
    }

    /// Draw a category uniformly from the active set
    pub fn sample(&self, rng: &mut impl Rng) -> Category {
        match self.active_count() {
            0 => Category::A,
            n => self.active().nth(rng.gen_range(0..n)).unwrap_or(Category::A),
        }
    }
}
