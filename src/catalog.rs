// src/catalog.rs
//! Fixed style and theme catalogs.

use crate::models::StyleSuggestion;

pub const DEFAULT_STYLE_ID: &str = "executive";
pub const DEFAULT_THEME_ID: &str = "corporate_navy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DesignTheme {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub colors: [&'static str; 3],
}

pub static DESIGN_THEMES: [DesignTheme; 6] = [
    DesignTheme {
        id: "corporate_navy",
        name: "Corporate Navy",
        description: "Classic executive",
        colors: ["#1a1a2e", "#14b8a6", "#f8fafc"],
    },
    DesignTheme {
        id: "midnight_blue",
        name: "Midnight Blue",
        description: "Deep blue accents",
        colors: ["#0f172a", "#3b82f6", "#f1f5f9"],
    },
    DesignTheme {
        id: "emerald_pro",
        name: "Emerald Pro",
        description: "Sophisticated green",
        colors: ["#1a2e1a", "#10b981", "#f0fdf4"],
    },
    DesignTheme {
        id: "sunset_warm",
        name: "Sunset Warm",
        description: "Bold warm tones",
        colors: ["#451a03", "#f97316", "#fff7ed"],
    },
    DesignTheme {
        id: "royal_purple",
        name: "Royal Purple",
        description: "Premium purple",
        colors: ["#2e1065", "#a855f7", "#faf5ff"],
    },
    DesignTheme {
        id: "monochrome_minimal",
        name: "Monochrome",
        description: "Black & white",
        colors: ["#18181b", "#71717a", "#fafafa"],
    },
];

pub fn theme_position(id: &str) -> Option<usize> {
    DESIGN_THEMES.iter().position(|t| t.id == id)
}

const DEFAULT_STYLES: [(&str, &str, &str, &str); 5] = [
    ("executive", "Executive Formal", "Board-level deck with precise data.", "briefcase"),
    ("sales", "Sales & Commercial", "Persuasive pitch built around ROI.", "trending-up"),
    ("financial", "Financial Analysis", "Financial metrics and trends.", "bar-chart"),
    ("product", "Product Showcase", "Features, benefits and roadmap.", "box"),
    ("informal", "Informal & Creative", "Casual tone for internal teams.", "smile"),
];

pub fn default_styles() -> Vec<StyleSuggestion> {
    DEFAULT_STYLES
        .iter()
        .map(|&(id, name, description, icon)| StyleSuggestion {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            match_score: None,
            reason: None,
            is_recommended: None,
        })
        .collect()
}

/// The list of styles currently on offer: either the backend's ranked
/// suggestions or the fixed defaults. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleCatalog {
    styles: Vec<StyleSuggestion>,
    suggested: bool,
}

impl StyleCatalog {
    pub fn defaults() -> Self {
        Self {
            styles: default_styles(),
            suggested: false,
        }
    }

    /// Uses the server suggestions, or the defaults when there are none.
    pub fn from_suggestions(suggestions: Vec<StyleSuggestion>) -> Self {
        if suggestions.is_empty() {
            return Self::defaults();
        }
        Self {
            styles: suggestions,
            suggested: true,
        }
    }

    /// Whether the entries carry server scores and reasons.
    pub fn is_suggested(&self) -> bool {
        self.suggested
    }

    pub fn styles(&self) -> &[StyleSuggestion] {
        &self.styles
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.styles.iter().position(|s| s.id == id)
    }

    pub fn recommended(&self) -> Option<&StyleSuggestion> {
        self.styles.iter().find(|s| s.is_recommended())
    }
}
