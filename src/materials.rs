use std::sync::LazyLock;

use chrono::Datelike;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

use crate::domain::FormLevel;
use crate::error::PapersError;
use crate::manifest::integral;

pub const MIN_MATERIAL_YEAR: i32 = 1990;

static SLUG_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: String,
    pub title: String,
    pub category: String,
    pub form: FormLevel,
    pub year: i32,
    pub subject: Option<String>,
    pub file_key: Option<String>,
    pub created_at: String,
}

pub fn validate_material(input: &Value) -> Result<Material, PapersError> {
    validate_material_for_year(input, chrono::Utc::now().year())
}

pub fn validate_material_for_year(input: &Value, current_year: i32) -> Result<Material, PapersError> {
    let object = input
        .as_object()
        .ok_or_else(|| PapersError::InvalidMaterial("request body must be an object".to_string()))?;
    let text = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("")
            .to_string()
    };

    let category = text("category");
    let title = text("title");
    let subject = text("subject");
    let file_key = text("fileKey");

    if category.is_empty() {
        return Err(PapersError::InvalidMaterial("category is required".to_string()));
    }
    let form = object
        .get("form")
        .and_then(integral)
        .and_then(FormLevel::from_i64)
        .ok_or_else(|| PapersError::InvalidMaterial("form must be between 1 and 5".to_string()))?;
    let max_year = current_year + 1;
    let year = object
        .get("year")
        .and_then(integral)
        .and_then(|year| i32::try_from(year).ok())
        .filter(|year| (MIN_MATERIAL_YEAR..=max_year).contains(year))
        .ok_or_else(|| {
            PapersError::InvalidMaterial(format!(
                "year must be between {MIN_MATERIAL_YEAR} and {max_year}"
            ))
        })?;

    let id = build_material_id(&category, form, year, &title);
    let title = if title.is_empty() {
        format!("{category} Form {form}")
    } else {
        title
    };

    Ok(Material {
        id,
        title,
        category,
        form,
        year,
        subject: (!subject.is_empty()).then_some(subject),
        file_key: (!file_key.is_empty()).then_some(file_key),
        created_at: chrono::Utc::now().to_rfc3339(),
    })
}

pub fn build_material_id(category: &str, form: FormLevel, year: i32, title: &str) -> String {
    let source = if title.is_empty() { category } else { title };
    let lowered = source.to_lowercase();
    let slug = SLUG_SEPARATORS.replace_all(&lowered, "-");
    let slug = slug.trim_matches('-');
    let slug = if slug.is_empty() { "material" } else { slug };
    format!("{year}-f{form}-{slug}")
}
