use past_papers::domain::{FormLevel, Paper};
use past_papers::query::{
    list_papers_by_form_subject_year, list_subjects_by_form, list_years_by_form_subject,
    search_papers_by_subject,
};

fn paper(id: &str, form: u8, subject: &str, year: i32) -> Paper {
    Paper {
        id: id.to_string(),
        form: FormLevel::new(form).unwrap(),
        subject: subject.to_string(),
        year,
        title: format!("{subject} Form {form} {year}"),
        pdf_url: format!("https://cdn.example/{id}.pdf"),
        size_bytes: None,
        updated_at: "2026-01-01T00:00:00Z".to_string(),
    }
}

fn form(value: u8) -> FormLevel {
    FormLevel::new(value).unwrap()
}

#[test]
fn years_are_most_recent_first() {
    let papers = vec![
        paper("a", 2, "Mathematics", 2023),
        paper("b", 2, "Mathematics", 2025),
        paper("c", 2, "Mathematics", 2024),
        paper("d", 2, "Mathematics", 2025),
        paper("e", 3, "Mathematics", 2026),
        paper("f", 2, "Physics", 2022),
    ];
    assert_eq!(
        list_years_by_form_subject(&papers, form(2), "Mathematics"),
        vec![2025, 2024, 2023]
    );
}

#[test]
fn search_is_case_insensitive_and_ordered() {
    let papers = vec![
        paper("maths-f3-2024", 3, "Mathematics", 2024),
        paper("further-f5-2025", 5, "Further Maths", 2025),
        paper("maths-f1-2023", 1, "Mathematics", 2023),
        paper("maths-f1-2025", 1, "Mathematics", 2025),
        paper("english-f1-2025", 1, "English Language", 2025),
    ];

    let ids: Vec<_> = search_papers_by_subject(&papers, "  MATH ")
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();

    assert_eq!(
        ids,
        vec![
            "further-f5-2025",
            "maths-f1-2025",
            "maths-f1-2023",
            "maths-f3-2024",
        ]
    );
}

#[test]
fn browse_filters_by_tuple() {
    let papers = vec![
        paper("a", 1, "Biology", 2024),
        paper("b", 1, "Biology", 2023),
        paper("c", 2, "Biology", 2024),
        paper("d", 1, "Chemistry", 2024),
    ];

    assert_eq!(list_subjects_by_form(&papers, form(1)), vec!["Biology", "Chemistry"]);
    assert!(list_subjects_by_form(&papers, form(5)).is_empty());

    let ids: Vec<_> = list_papers_by_form_subject_year(&papers, form(1), "Biology", 2024)
        .into_iter()
        .map(|p| p.id.as_str())
        .collect();
    assert_eq!(ids, vec!["a"]);
}
