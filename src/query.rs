use std::collections::BTreeSet;

use crate::domain::{FormLevel, Paper};

pub fn list_forms(papers: &[Paper]) -> Vec<FormLevel> {
    papers
        .iter()
        .map(|paper| paper.form)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub fn list_subjects_by_form(papers: &[Paper], form: FormLevel) -> Vec<String> {
    papers
        .iter()
        .filter(|paper| paper.form == form)
        .map(|paper| paper.subject.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

pub fn list_years_by_form_subject(papers: &[Paper], form: FormLevel, subject: &str) -> Vec<i32> {
    papers
        .iter()
        .filter(|paper| paper.form == form && paper.subject == subject)
        .map(|paper| paper.year)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .rev()
        .collect()
}

pub fn list_papers_by_form_subject_year<'a>(
    papers: &'a [Paper],
    form: FormLevel,
    subject: &str,
    year: i32,
) -> Vec<&'a Paper> {
    let mut matches: Vec<&Paper> = papers
        .iter()
        .filter(|paper| paper.form == form && paper.subject == subject && paper.year == year)
        .collect();
    matches.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    matches
}

pub fn search_papers_by_subject<'a>(papers: &'a [Paper], term: &str) -> Vec<&'a Paper> {
    let needle = term.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }

    let mut matches: Vec<&Paper> = papers
        .iter()
        .filter(|paper| paper.subject.to_lowercase().contains(&needle))
        .collect();
    matches.sort_by(|a, b| {
        a.subject
            .cmp(&b.subject)
            .then(a.form.cmp(&b.form))
            .then(b.year.cmp(&a.year))
    });
    matches
}

pub fn find_paper<'a>(papers: &'a [Paper], id: &str) -> Option<&'a Paper> {
    papers.iter().find(|paper| paper.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(id: &str, form: u8, subject: &str, year: i32, updated_at: &str) -> Paper {
        Paper {
            id: id.to_string(),
            form: FormLevel::new(form).unwrap(),
            subject: subject.to_string(),
            year,
            title: format!("{subject} {year}"),
            pdf_url: format!("https://cdn.example/{id}.pdf"),
            size_bytes: None,
            updated_at: updated_at.to_string(),
        }
    }

    #[test]
    fn subjects_are_distinct_and_sorted() {
        let papers = vec![
            paper("a", 1, "Physics", 2024, "t"),
            paper("b", 1, "Biology", 2024, "t"),
            paper("c", 1, "Physics", 2023, "t"),
            paper("d", 2, "Art", 2024, "t"),
            paper("e", 1, "biology", 2024, "t"),
        ];
        assert_eq!(
            list_subjects_by_form(&papers, FormLevel::new(1).unwrap()),
            vec!["Biology", "Physics", "biology"]
        );
    }

    #[test]
    fn forms_present() {
        let papers = vec![
            paper("a", 4, "Physics", 2024, "t"),
            paper("b", 1, "Biology", 2024, "t"),
            paper("c", 4, "Biology", 2024, "t"),
        ];
        let forms: Vec<u8> = list_forms(&papers).into_iter().map(FormLevel::get).collect();
        assert_eq!(forms, vec![1, 4]);
    }

    #[test]
    fn papers_newest_update_first_with_stable_ties() {
        let papers = vec![
            paper("old", 3, "History", 2022, "2025-01-01T00:00:00Z"),
            paper("tie-1", 3, "History", 2022, "2025-06-01T00:00:00Z"),
            paper("new", 3, "History", 2022, "2026-01-01T00:00:00Z"),
            paper("tie-2", 3, "History", 2022, "2025-06-01T00:00:00Z"),
            paper("other-year", 3, "History", 2021, "2027-01-01T00:00:00Z"),
        ];
        let ids: Vec<_> = list_papers_by_form_subject_year(
            &papers,
            FormLevel::new(3).unwrap(),
            "History",
            2022,
        )
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
        assert_eq!(ids, vec!["new", "tie-1", "tie-2", "old"]);
    }

    #[test]
    fn blank_search_matches_nothing() {
        let papers = vec![paper("a", 1, "Mathematics", 2024, "t")];
        assert!(search_papers_by_subject(&papers, "   ").is_empty());
    }

    #[test]
    fn find_by_id() {
        let papers = vec![paper("a", 1, "Mathematics", 2024, "t")];
        assert!(find_paper(&papers, "a").is_some());
        assert!(find_paper(&papers, "b").is_none());
    }
}
