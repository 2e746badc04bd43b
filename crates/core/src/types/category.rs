//! Category types.
//!
//! Categories form a tree; the API returns roots with nested `children`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Abbreviated category reference embedded in product payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

/// A full category node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub parent_id: Option<Uuid>,
    pub sort_order: i32,
    #[serde(default)]
    pub children: Vec<Category>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    /// Depth-first iterator over this category and all descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.children.iter().rev());
            Some(node)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn category(name: &str, children: Vec<Category>) -> Category {
        Category {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: name.to_lowercase(),
            description: None,
            parent_id: None,
            sort_order: 0,
            children,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_walk_visits_depth_first() {
        let tree = category(
            "Kitchen",
            vec![
                category("Cookware", vec![category("Pans", vec![])]),
                category("Utensils", vec![]),
            ],
        );
        let names: Vec<&str> = tree.walk().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Kitchen", "Cookware", "Pans", "Utensils"]);
    }
}
