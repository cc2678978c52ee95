// src/flow/selector.rs
use crate::catalog::{
    DEFAULT_STYLE_ID, DEFAULT_THEME_ID, DESIGN_THEMES, DesignTheme, StyleCatalog, theme_position,
};
use crate::errors::FlowError;
use crate::models::StyleSuggestion;

/// Chosen style and theme, held as indices that are valid for the catalogs
/// they point into.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    catalog: StyleCatalog,
    style: usize,
    theme: usize,
}

impl Default for Selection {
    fn default() -> Self {
        Self::new(StyleCatalog::defaults())
    }
}

impl Selection {
    /// Starts at the default style (or the catalog's first entry when it
    /// does not offer one) and the default theme.
    pub fn new(catalog: StyleCatalog) -> Self {
        let style = catalog.position(DEFAULT_STYLE_ID).unwrap_or(0);
        Self {
            catalog,
            style,
            theme: theme_position(DEFAULT_THEME_ID).unwrap_or(0),
        }
    }

    pub fn select_style(&mut self, id: &str) -> Result<(), FlowError> {
        self.style = self
            .catalog
            .position(id)
            .ok_or_else(|| FlowError::UnknownStyle(id.to_string()))?;
        Ok(())
    }

    pub fn select_theme(&mut self, id: &str) -> Result<(), FlowError> {
        self.theme = theme_position(id).ok_or_else(|| FlowError::UnknownTheme(id.to_string()))?;
        Ok(())
    }

    pub fn catalog(&self) -> &StyleCatalog {
        &self.catalog
    }

    pub fn style(&self) -> &StyleSuggestion {
        &self.catalog.styles()[self.style]
    }

    pub fn theme(&self) -> &'static DesignTheme {
        &DESIGN_THEMES[self.theme]
    }

    pub fn style_id(&self) -> &str {
        &self.style().id
    }

    pub fn theme_id(&self) -> &'static str {
        self.theme().id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_styles;

    fn suggestion(id: &str, recommended: bool) -> StyleSuggestion {
        StyleSuggestion {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: String::new(),
            icon: "box".to_string(),
            match_score: Some(if recommended { 5.0 } else { 0.0 }),
            reason: None,
            is_recommended: Some(recommended),
        }
    }

    #[test]
    fn defaults_to_executive_and_corporate_navy() {
        let selection = Selection::default();
        assert_eq!(selection.style_id(), "executive");
        assert_eq!(selection.theme_id(), "corporate_navy");
        assert_eq!(selection.theme().colors.len(), 3);
    }

    #[test]
    fn unknown_ids_are_rejected_without_changing_selection() {
        let mut selection = Selection::default();
        selection.select_style("financial").unwrap();
        selection.select_theme("royal_purple").unwrap();

        assert_eq!(
            selection.select_style("keynote"),
            Err(FlowError::UnknownStyle("keynote".into()))
        );
        assert_eq!(
            selection.select_theme("neon"),
            Err(FlowError::UnknownTheme("neon".into()))
        );
        assert_eq!(selection.style_id(), "financial");
        assert_eq!(selection.theme_id(), "royal_purple");
    }

    #[test]
    fn suggested_catalog_starts_at_default_style_when_offered() {
        let selection = Selection::new(StyleCatalog::from_suggestions(vec![
            suggestion("financial", true),
            suggestion("executive", false),
        ]));
        assert_eq!(selection.style_id(), "executive");
        assert!(selection.catalog().is_suggested());
    }

    #[test]
    fn suggested_catalog_without_default_starts_at_first_entry() {
        let selection = Selection::new(StyleCatalog::from_suggestions(vec![
            suggestion("product", false),
            suggestion("sales", true),
        ]));
        assert_eq!(selection.style_id(), "product");

        let fallback = Selection::new(StyleCatalog::from_suggestions(Vec::new()));
        assert_eq!(fallback.catalog().styles(), default_styles().as_slice());
    }
}
