//! Homepage content: one typed document at row id 1, last write wins.

use crate::error::AppError;
use crate::infra::get_connection;
use crate::infra::DbPool;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const HOMEPAGE_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Localized {
    pub zh: String,
    pub en: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HeroSection {
    pub title: Localized,
    pub subtitle: Localized,
    pub cta_text: Localized,
    pub cta_link: String,
    pub background_image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AboutSection {
    pub title: Localized,
    pub content: Localized,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Highlight {
    pub icon: String,
    pub title: Localized,
    pub description: Localized,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactSection {
    pub email: String,
    pub github: String,
    pub twitter: String,
    pub wechat: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FooterSection {
    pub text: Localized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HomepageContent {
    pub schema_version: u32,
    pub hero: HeroSection,
    pub about: AboutSection,
    pub highlights: Vec<Highlight>,
    pub contact: ContactSection,
    pub footer: FooterSection,
}

impl Default for HomepageContent {
    fn default() -> Self {
        Self {
            schema_version: HOMEPAGE_SCHEMA_VERSION,
            hero: HeroSection::default(),
            about: AboutSection::default(),
            highlights: Vec::new(),
            contact: ContactSection::default(),
            footer: FooterSection::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HomepageDto {
    pub content: HomepageContent,
    /// `None` until the first save.
    pub updated_at: Option<String>,
}

impl HomepageContent {
    /// Parse a stored or submitted document, upgrading older shapes.
    ///
    /// Version 0 is the untyped flat blob (`hero_title_zh`, `contact_email`, ...)
    /// the admin console used to post; it carries no `schema_version` key.
    pub fn from_json(value: Value) -> Result<Self, AppError> {
        let version = match value.get("schema_version") {
            None => 0,
            Some(v) => v
                .as_u64()
                .ok_or_else(|| AppError::Validation("schema_version must be a number".into()))?,
        };
        let mut content = match version {
            0 => match value {
                Value::Object(map) => upgrade_v0(&map)?,
                _ => return Err(AppError::Validation("homepage content must be an object".into())),
            },
            1 => serde_json::from_value(value)
                .map_err(|e| AppError::Validation(format!("invalid homepage content: {}", e)))?,
            other => {
                return Err(AppError::Validation(format!(
                    "unsupported schema_version {}",
                    other
                )))
            }
        };
        content.schema_version = HOMEPAGE_SCHEMA_VERSION;
        Ok(content)
    }
}

/// Every key the flat v0 blob could carry; anything else is rejected.
const V0_KEYS: &[&str] = &[
    "hero_title_zh",
    "hero_title_en",
    "hero_subtitle_zh",
    "hero_subtitle_en",
    "hero_cta_zh",
    "hero_cta_en",
    "hero_cta_link",
    "hero_image",
    "about_title_zh",
    "about_title_en",
    "about_content_zh",
    "about_content_en",
    "about_avatar",
    "contact_email",
    "contact_github",
    "contact_twitter",
    "contact_wechat",
    "footer_text_zh",
    "footer_text_en",
];

fn text(map: &Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn localized(map: &Map<String, Value>, prefix: &str) -> Localized {
    Localized {
        zh: text(map, &format!("{}_zh", prefix)),
        en: text(map, &format!("{}_en", prefix)),
    }
}

fn optional(map: &Map<String, Value>, key: &str) -> Option<String> {
    Some(text(map, key)).filter(|s| !s.is_empty())
}

fn upgrade_v0(map: &Map<String, Value>) -> Result<HomepageContent, AppError> {
    for (key, value) in map {
        if !V0_KEYS.contains(&key.as_str()) {
            return Err(AppError::Validation(format!("unknown homepage field: {}", key)));
        }
        if !(value.is_string() || value.is_null()) {
            return Err(AppError::Validation(format!(
                "homepage field {} must be a string",
                key
            )));
        }
    }
    Ok(HomepageContent {
        schema_version: HOMEPAGE_SCHEMA_VERSION,
        hero: HeroSection {
            title: localized(map, "hero_title"),
            subtitle: localized(map, "hero_subtitle"),
            cta_text: localized(map, "hero_cta"),
            cta_link: text(map, "hero_cta_link"),
            background_image: optional(map, "hero_image"),
        },
        about: AboutSection {
            title: localized(map, "about_title"),
            content: localized(map, "about_content"),
            avatar: optional(map, "about_avatar"),
        },
        highlights: Vec::new(),
        contact: ContactSection {
            email: text(map, "contact_email"),
            github: text(map, "contact_github"),
            twitter: text(map, "contact_twitter"),
            wechat: text(map, "contact_wechat"),
        },
        footer: FooterSection {
            text: localized(map, "footer_text"),
        },
    })
}

pub fn homepage_get(pool: &DbPool) -> Result<HomepageDto, AppError> {
    let row: Option<(String, String)> = {
        let conn = get_connection(pool);
        conn.query_row(
            "SELECT content, updated_at FROM homepage WHERE id = 1",
            [],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .optional()?
    };
    match row {
        None => Ok(HomepageDto {
            content: HomepageContent::default(),
            updated_at: None,
        }),
        Some((raw, updated_at)) => {
            let value: Value = serde_json::from_str(&raw)
                .map_err(|e| AppError::Internal(format!("stored homepage is not JSON: {}", e)))?;
            Ok(HomepageDto {
                content: HomepageContent::from_json(value)?,
                updated_at: Some(updated_at),
            })
        }
    }
}

/// Overwrite the whole document. Concurrent saves: the later one wins.
pub fn homepage_save(pool: &DbPool, content: HomepageContent) -> Result<HomepageDto, AppError> {
    let mut content = content;
    content.schema_version = HOMEPAGE_SCHEMA_VERSION;
    let raw = serde_json::to_string(&content).map_err(|e| AppError::Internal(e.to_string()))?;
    let now = Utc::now().to_rfc3339();
    {
        let conn = get_connection(pool);
        conn.execute(
            "INSERT INTO homepage (id, content, updated_at) VALUES (1, ?1, ?2) \
             ON CONFLICT(id) DO UPDATE SET content = excluded.content, updated_at = excluded.updated_at",
            params![raw, &now],
        )?;
    }
    log::info!("homepage content saved");
    Ok(HomepageDto {
        content,
        updated_at: Some(now),
    })
}
