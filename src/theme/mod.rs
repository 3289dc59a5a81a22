//! Theme catalog
//!
//! Themes scope riddle generation. Each one carries:
//! - A stable numeric id (also the key of its history in the persisted store)
//! - The title and description fed into the generation prompt
//! - An icon reference for the client

use serde::Serialize;

/// A selectable riddle theme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Theme {
    /// Unique identifier
    pub id: u32,
    /// Display title, also used for locale detection
    pub title: String,
    /// Short description passed to the model
    pub description: String,
    /// Icon name rendered by the client
    pub icon: &'static str,
}

impl Theme {
    fn new(id: u32, title: &str, description: &str, icon: &'static str) -> Self {
        Self {
            id,
            title: title.to_string(),
            description: description.to_string(),
            icon,
        }
    }

    /// Key of this theme's history in the persisted store
    pub fn store_key(&self) -> String {
        self.id.to_string()
    }
}

/// Registry of available themes, in display order
#[derive(Debug, Clone)]
pub struct ThemeCatalog {
    themes: Vec<Theme>,
}

impl ThemeCatalog {
    /// Create a catalog with the built-in themes
    pub fn new() -> Self {
        Self::with_themes(builtin_themes())
    }

    /// Create a catalog from an explicit list
    pub fn with_themes(themes: Vec<Theme>) -> Self {
        Self { themes }
    }

    /// Get a theme by id
    pub fn get(&self, id: u32) -> Option<&Theme> {
        self.themes.iter().find(|t| t.id == id)
    }

    /// List all themes
    pub fn list(&self) -> &[Theme] {
        &self.themes
    }
}

impl Default for ThemeCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn builtin_themes() -> Vec<Theme> {
    vec![
        Theme::new(
            1,
            "ألغاز المستقبل والخيال العلمي",
            "صور تدمج التكنولوجيا المتقدمة مع الأسئلة الوجودية، وتخفي ألغازاً في تفاصيلها الرقمية والمستقبلية.",
            "brain",
        ),
        Theme::new(
            2,
            "أسرار العوالم الموازية",
            "لوحات فنية تستكشف أكواناً بديلة وقوانين فيزيائية مختلفة، وتحتوي على ألغاز تتحدى مفاهيم الواقع.",
            "universe",
        ),
        Theme::new(
            3,
            "فن سريالي ورقمي",
            "إبداعات تتحدى المنطق وتدمج الأحلام بالكوابيس، حيث يكون اللغز هو تفسير الرموز السريالية نفسها.",
            "eye",
        ),
        Theme::new(
            4,
            "أحاجي التاريخ والماضي",
            "صور تعيد تصور أحداث تاريخية غامضة أو شخصيات أسطورية، وتتضمن ألغازاً مخفية في القطع الأثرية أو الرموز القديمة.",
            "clock",
        ),
        Theme::new(
            5,
            "رموز الطبيعة والبيئة",
            "مشاهد طبيعية ساحرة بشكل غير عادي، تحتوي على ألغاز تتعلق بالأنماط الخفية في الطبيعة أو رسائل بيئية عميقة.",
            "leaf",
        ),
        Theme::new(
            6,
            "غموض الجريمة والتحقيق",
            "صور فنية تصور مسرح جريمة أو لغز بوليسي معقد، حيث تكون الأدلة الخفية هي مفتاح حل اللغز.",
            "key",
        ),
    ]
}
