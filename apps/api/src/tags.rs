use std::collections::HashSet;

use axum::Json;

/// Skills offered in the tag picker at registration and on the profile page.
pub const PREDEFINED_SKILLS: &[&str] = &[
    "Python",
    "Java",
    "JavaScript",
    "TypeScript",
    "C++",
    "Rust",
    "Go",
    "SQL",
    "React",
    "Node.js",
    "Machine Learning",
    "Data Science",
    "AI",
    "Cloud Computing",
    "AWS",
    "DevOps",
    "Cybersecurity",
    "Mobile Development",
    "UI/UX Design",
    "Project Management",
    "Communication",
    "Leadership",
];

/// Job preferences offered in the tag picker.
pub const JOB_PREFERENCES: &[&str] = &[
    "Software Engineering",
    "Data Science",
    "Machine Learning",
    "Web Development",
    "Product Management",
    "Cybersecurity",
    "Cloud Engineering",
    "Consulting",
    "Finance",
    "Healthcare",
    "Technology",
    "Internship",
    "Full-Time",
    "Part-Time",
    "Remote",
];

pub const EVENT_TYPES: &[&str] = &["In-Person", "Virtual", "Hybrid"];

/// GET /api/tags/skills
pub async fn handle_skills() -> Json<&'static [&'static str]> {
    Json(PREDEFINED_SKILLS)
}

/// GET /api/tags/preferences
pub async fn handle_preferences() -> Json<&'static [&'static str]> {
    Json(JOB_PREFERENCES)
}

/// GET /api/tags/event-types
pub async fn handle_event_types() -> Json<&'static [&'static str]> {
    Json(EVENT_TYPES)
}

/// Trims every tag, drops blanks and removes case-insensitive duplicates.
/// First spelling wins and input order is preserved.
pub fn normalize_tags<I, S>(tags: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    tags.into_iter()
        .filter_map(|t| {
            let trimmed = t.as_ref().trim();
            if trimmed.is_empty() || !seen.insert(trimmed.to_lowercase()) {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
        .collect()
}
