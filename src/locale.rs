//! User-facing message localization
//!
//! The active language follows the theme: a title containing any Latin
//! letter selects English, anything else selects Arabic.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static LATIN_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[a-zA-Z]").unwrap());

/// Language of user-facing messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    English,
    Arabic,
}

impl Locale {
    /// Detect the locale from a theme title
    pub fn detect(title: &str) -> Self {
        if LATIN_REGEX.is_match(title) {
            Locale::English
        } else {
            Locale::Arabic
        }
    }

    /// Text direction for the client
    pub fn direction(&self) -> &'static str {
        match self {
            Locale::English => "ltr",
            Locale::Arabic => "rtl",
        }
    }
}

/// User action a failure message refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Generate,
    Improve,
    Images,
}

/// Message shown when the AI service is throttling requests
pub fn rate_limited(locale: Locale) -> &'static str {
    match locale {
        Locale::English => {
            "You're making requests too quickly. Please wait a moment and try again."
        }
        Locale::Arabic => {
            "لقد قمت بتقديم طلبات كثيرة جدًا بسرعة. يرجى الانتظار لحظة ثم المحاولة مرة أخرى."
        }
    }
}

/// Generic failure message for an action
pub fn failed(action: Action, locale: Locale) -> &'static str {
    match (action, locale) {
        (Action::Generate, Locale::English) => {
            "Failed to generate a new riddle concept. The model might be temporarily unavailable or the request was blocked."
        }
        (Action::Generate, Locale::Arabic) => {
            "فشل في إنشاء مفهوم لغز جديد. قد يكون النموذج غير متاح مؤقتًا أو تم حظر الطلب."
        }
        (Action::Improve, Locale::English) => "Failed to improve the description.",
        (Action::Improve, Locale::Arabic) => "فشل في تحسين الوصف.",
        (Action::Images, Locale::English) => {
            "Failed to generate images. The model might be temporarily unavailable or the request was blocked."
        }
        (Action::Images, Locale::Arabic) => {
            "فشل في إنشاء الصور. قد يكون النموذج غير متاح مؤقتًا أو تم حظر الطلب."
        }
    }
}

/// Message shown when the image model returned nothing
pub fn no_images(locale: Locale) -> &'static str {
    match locale {
        Locale::English => {
            "The model did not return any images. The prompt may have been rejected for safety reasons."
        }
        Locale::Arabic => "لم يقم النموذج بإرجاع أي صور. ربما تم رفض النص لأسباب تتعلق بالسلامة.",
    }
}

/// Message for an unknown theme or riddle
pub fn not_found(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "Not found.",
        Locale::Arabic => "غير موجود.",
    }
}

/// Message for a duplicate submission of an action still in flight
pub fn busy(locale: Locale) -> &'static str {
    match locale {
        Locale::English => "This action is already in progress.",
        Locale::Arabic => "هذا الإجراء قيد التنفيذ بالفعل.",
    }
}
