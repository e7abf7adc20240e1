//! Canonical knowledge categories and their bilingual synonyms.
//!
//! App category names ("Ăn uống", "Food & Drinks", "Đi chợ"…) do not match
//! the knowledge base's category keys directly. The table below maps a
//! free-text name to a canonical key by substring matching. Entries are
//! checked in order and the first hit wins, so broader synonyms must come
//! after the narrower ones they could shadow.
//!
//! A name that matches nothing is returned lower-cased and trimmed; the
//! knowledge store then falls back to unfiltered retrieval if no document
//! carries that category.

/// Canonical key → synonyms (lower-case, English and Vietnamese).
pub const CATEGORY_SYNONYMS: &[(&str, &[&str])] = &[
    ("food", &["food", "thực phẩm", "ăn"]),
    ("transport", &["transport", "đi lại", "xe"]),
    ("entertainment", &["entertainment", "giải trí"]),
    ("medical", &["medical", "y tế", "sức khỏe"]),
    ("education", &["education", "giáo dục", "học"]),
    ("clothing", &["clothing", "quần áo"]),
    ("home", &["home", "nhà"]),
    ("gym", &["gym", "fitness", "thể dục"]),
    ("beauty", &["beauty", "làm đẹp"]),
    ("childcare", &["child", "trẻ em"]),
    ("groceries", &["grocer", "đi chợ", "tạp hóa"]),
    ("budgeting", &["budget", "ngân sách"]),
    ("saving", &["sav", "tiết kiệm"]),
    ("debt", &["debt", "nợ"]),
    ("investing", &["invest", "đầu tư"]),
];

/// Map a free-text category name to its canonical key.
pub fn normalize_category(name: &str) -> String {
    let lower = name.trim().to_lowercase();
    canonical_category(&lower)
        .map(str::to_string)
        .unwrap_or(lower)
}

/// The canonical key for an already lower-cased name, if any synonym matches.
pub fn canonical_category(lower: &str) -> Option<&'static str> {
    CATEGORY_SYNONYMS
        .iter()
        .find(|(_, synonyms)| synonyms.iter().any(|s| lower.contains(s)))
        .map(|(key, _)| *key)
}

/// All canonical category keys, in table order.
pub fn canonical_categories() -> impl Iterator<Item = &'static str> {
    CATEGORY_SYNONYMS.iter().map(|(key, _)| *key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_names_map_to_keys() {
        assert_eq!(normalize_category("Food & Drinks"), "food");
        assert_eq!(normalize_category("  Transportation "), "transport");
        assert_eq!(normalize_category("Savings"), "saving");
        assert_eq!(normalize_category("Investments"), "investing");
        assert_eq!(normalize_category("Childcare"), "childcare");
    }

    #[test]
    fn vietnamese_names_map_to_keys() {
        assert_eq!(normalize_category("Ăn uống"), "food");
        assert_eq!(normalize_category("Giải trí"), "entertainment");
        assert_eq!(normalize_category("Tiết kiệm"), "saving");
        assert_eq!(normalize_category("Trả nợ"), "debt");
        assert_eq!(normalize_category("Ngân sách"), "budgeting");
    }

    #[test]
    fn first_match_wins() {
        // "Đi chợ" contains no earlier synonym, so it reaches groceries.
        assert_eq!(normalize_category("Đi chợ"), "groceries");
        // "Nhà hàng" (restaurant) hits "nhà" before anything food-related.
        assert_eq!(normalize_category("Nhà hàng"), "home");
    }

    #[test]
    fn unknown_names_are_lowercased() {
        assert_eq!(normalize_category("  Pets "), "pets");
        assert_eq!(normalize_category(""), "");
    }

    #[test]
    fn every_key_is_its_own_canonical_form() {
        for key in canonical_categories() {
            assert_eq!(normalize_category(key), key, "key {key} is not stable");
        }
    }
}
