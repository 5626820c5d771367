//! Per-category disposal instructions.

use serde::Serialize;

/// How to dispose of one waste category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisposalInfo {
    pub category: &'static str,
    pub recyclable: bool,
    pub bin: &'static str,
    pub steps: &'static [&'static str],
    pub tips: &'static str,
    pub dangers: &'static [&'static str],
    pub schedule: &'static str,
    pub preparation: &'static str,
}

static TEXTILE: DisposalInfo = DisposalInfo {
    category: "Textile",
    recyclable: true,
    bin: "Textile Recycling Center",
    steps: &[
        "Clean the textile item if needed",
        "Check for any damages that might affect recycling",
        "Place in designated textile recycling bin",
        "Alternatively, donate if item is in good condition",
    ],
    tips: "Donate if wearable or take to specialized recycling",
    dangers: &["Avoid putting dirty or heavily damaged textiles in regular recycling"],
    schedule: "Textile collection: Wednesdays and Saturdays",
    preparation: "24-48 hours for cleaning if needed",
};

static PLASTIC: DisposalInfo = DisposalInfo {
    category: "Plastic",
    recyclable: true,
    bin: "Recycling Bin (Blue)",
    steps: &[
        "Remove all labels and stickers",
        "Rinse thoroughly with water",
        "Let dry completely",
        "Place in blue recycling bin",
    ],
    tips: "Check recycling codes - numbers 1-7 indicate different plastic types",
    dangers: &[
        "Never mix different plastic types",
        "Avoid contaminated plastics",
    ],
    schedule: "Plastic collection: Tuesdays and Fridays",
    preparation: "5-10 minutes for cleaning",
};

static ORGANIC: DisposalInfo = DisposalInfo {
    category: "Organic",
    recyclable: false,
    bin: "Compost Bin (Green)",
    steps: &[
        "Separate from any packaging",
        "Chop large pieces into smaller chunks",
        "Place in green compost bin",
        "Cover with brown materials if home composting",
    ],
    tips: "Perfect for home composting - creates nutrient-rich soil",
    dangers: &["Avoid meat, dairy, and oily foods in home compost"],
    schedule: "Organic waste collection: Daily pickup available",
    preparation: "Immediate disposal recommended",
};

static GENERAL: DisposalInfo = DisposalInfo {
    category: "General",
    recyclable: false,
    bin: "General Waste Bin",
    steps: &["Place item in general waste bin"],
    tips: "Check with local waste management for specific guidelines",
    dangers: &["Follow local disposal regulations"],
    schedule: "General waste collection: Daily",
    preparation: "None required",
};

static GUIDES: &[&DisposalInfo] = &[&TEXTILE, &PLASTIC, &ORGANIC];

/// Guide for a category, matched case-insensitively. Unknown categories get
/// the general waste guide.
pub fn lookup(category: &str) -> &'static DisposalInfo {
    let category = category.trim();
    GUIDES
        .iter()
        .copied()
        .find(|g| g.category.eq_ignore_ascii_case(category))
        .unwrap_or(&GENERAL)
}

/// Categories with a dedicated guide.
pub fn known_categories() -> impl Iterator<Item = &'static str> {
    GUIDES.iter().map(|g| g.category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_category() {
        let guide = lookup("Plastic");
        assert!(guide.recyclable);
        assert_eq!(guide.bin, "Recycling Bin (Blue)");
        assert_eq!(guide.steps.len(), 4);
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(lookup("organic").bin, "Compost Bin (Green)");
        assert_eq!(lookup("  TEXTILE ").bin, "Textile Recycling Center");
    }

    #[test]
    fn test_unknown_category_falls_back() {
        let guide = lookup("Electronics");
        assert_eq!(guide.category, "General");
        assert_eq!(guide.bin, "General Waste Bin");
        assert!(!guide.recyclable);
    }

    #[test]
    fn test_known_categories() {
        let categories: Vec<_> = known_categories().collect();
        assert_eq!(categories, vec!["Textile", "Plastic", "Organic"]);
    }
}
