//! Mapping from classifier tag names to waste categories.
//!
//! The membership lists are fixed data. They are folded into a single lookup
//! table the first time it is needed, so classifying a tag is one hash lookup.
//! Matching is exact and case sensitive.

use crate::types::Category;
use std::collections::HashMap;
use std::sync::OnceLock;

pub const RECYCLABLE_TAGS: &[&str] = &["键盘", "手机", "笔记本电脑", "鼠标", "瓶"];
pub const HAZARDOUS_TAGS: &[&str] = &["电池"];
pub const HOUSEHOLD_TAGS: &[&str] = &["瓜", "西瓜", "香蕉"];
pub const RESIDUAL_TAGS: &[&str] = &["眼镜", "食品包装", "笔", "纸巾"];

fn category_table() -> &'static HashMap<&'static str, Category> {
    static TABLE: OnceLock<HashMap<&'static str, Category>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let lists = [
            (Category::Recyclable, RECYCLABLE_TAGS),
            (Category::Hazardous, HAZARDOUS_TAGS),
            (Category::Household, HOUSEHOLD_TAGS),
            (Category::Residual, RESIDUAL_TAGS),
        ];
        lists
            .iter()
            .flat_map(|(category, tags)| tags.iter().map(move |tag| (*tag, *category)))
            .collect()
    })
}

/// Stateless tag to category lookup.
#[derive(Debug, Clone, Copy)]
pub struct CategoryClassifier {
    table: &'static HashMap<&'static str, Category>,
}

impl CategoryClassifier {
    pub fn new() -> Self {
        Self {
            table: category_table(),
        }
    }

    /// Category of `tag_name`, or [`Category::Unknown`] if it is in no list.
    pub fn classify(&self, tag_name: &str) -> Category {
        self.table
            .get(tag_name)
            .copied()
            .unwrap_or(Category::Unknown)
    }

    /// Number of known tags.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for CategoryClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_listed_tag_maps_to_its_category() {
        let classifier = CategoryClassifier::new();
        for tag in RECYCLABLE_TAGS {
            assert_eq!(classifier.classify(tag), Category::Recyclable, "{tag}");
        }
        for tag in HAZARDOUS_TAGS {
            assert_eq!(classifier.classify(tag), Category::Hazardous, "{tag}");
        }
        for tag in HOUSEHOLD_TAGS {
            assert_eq!(classifier.classify(tag), Category::Household, "{tag}");
        }
        for tag in RESIDUAL_TAGS {
            assert_eq!(classifier.classify(tag), Category::Residual, "{tag}");
        }
    }

    #[test]
    fn test_unlisted_tags_are_unknown() {
        let classifier = CategoryClassifier::new();
        assert_eq!(classifier.classify("橙子"), Category::Unknown);
        assert_eq!(classifier.classify(""), Category::Unknown);
        // No substring or whitespace tolerance
        assert_eq!(classifier.classify("瓶子"), Category::Unknown);
        assert_eq!(classifier.classify(" 瓶"), Category::Unknown);
    }

    #[test]
    fn test_lists_are_disjoint() {
        let total = RECYCLABLE_TAGS.len()
            + HAZARDOUS_TAGS.len()
            + HOUSEHOLD_TAGS.len()
            + RESIDUAL_TAGS.len();
        assert_eq!(CategoryClassifier::new().len(), total);
    }
}
