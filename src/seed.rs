use crate::domain::{FormLevel, ManifestPayload, Paper};

pub const SEED_UPDATED_AT: &str = "2026-02-23T00:00:00.000Z";

const SEED_PDF_BASE: &str = "https://papers.example.org/seed";

struct SeedRow {
    id: &'static str,
    form: u8,
    subject: &'static str,
    year: i32,
    title: &'static str,
}

const SEED_ROWS: &[SeedRow] = &[
    SeedRow {
        id: "f1-math-2025-term1",
        form: 1,
        subject: "Mathematics",
        year: 2025,
        title: "Mathematics Form 1 End of Term 1",
    },
    SeedRow {
        id: "f2-english-2024-final",
        form: 2,
        subject: "English Language",
        year: 2024,
        title: "English Form 2 Final",
    },
    SeedRow {
        id: "f4-physics-2025-mock",
        form: 4,
        subject: "Physics",
        year: 2025,
        title: "Form 4 Physics Mock",
    },
];

pub fn seed_manifest() -> ManifestPayload {
    let papers = SEED_ROWS
        .iter()
        .filter_map(|row| {
            let form = FormLevel::new(row.form).ok()?;
            Some(Paper {
                id: row.id.to_string(),
                form,
                subject: row.subject.to_string(),
                year: row.year,
                title: row.title.to_string(),
                pdf_url: format!("{SEED_PDF_BASE}/{}.pdf", row.id),
                size_bytes: None,
                updated_at: SEED_UPDATED_AT.to_string(),
            })
        })
        .collect();

    ManifestPayload {
        updated_at: SEED_UPDATED_AT.to_string(),
        papers,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::normalize_manifest;

    #[test]
    fn seed_is_a_valid_manifest() {
        let seed = seed_manifest();
        assert_eq!(seed.papers.len(), SEED_ROWS.len());

        let value = serde_json::to_value(&seed).unwrap();
        assert_eq!(normalize_manifest(&value), Some(seed));
    }
}
