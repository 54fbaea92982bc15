//! Heuristic resume parser used when the model cannot extract fields.

use std::sync::LazyLock;

use regex::Regex;

use crate::intelligence::CandidateFields;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").expect("valid regex")
});

static PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\+?1?\s*\(?[0-9]{3}\)?[-.\s]*[0-9]{3}[-.\s]*[0-9]{4}").expect("valid regex")
});

/// Sections the heuristic never fills in.
const UNPARSED_SECTIONS: [&str; 3] = ["skills", "experience", "education"];

/// Pulls name, email and phone out of plain resume text.
///
/// The name is the first non-blank line; skills, experience and education are
/// always reported missing.
pub fn parse_resume_heuristically(resume_text: &str) -> CandidateFields {
    let email = EMAIL_RE
        .find(resume_text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default();
    let phone = PHONE_RE
        .find(resume_text)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let name = resume_text
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or_default()
        .to_string();

    CandidateFields {
        name,
        email,
        phone,
        missing_info: UNPARSED_SECTIONS.iter().map(|s| s.to_string()).collect(),
        ..CandidateFields::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESUME: &str = "
        Grace Hopper
        Senior Engineer | grace.hopper@navy.mil | (555) 123-4567
        Experience: COBOL, compilers
    ";

    #[test]
    fn test_extracts_contact_fields() {
        let fields = parse_resume_heuristically(RESUME);
        assert_eq!(fields.name, "Grace Hopper");
        assert_eq!(fields.email, "grace.hopper@navy.mil");
        assert_eq!(fields.phone, "(555) 123-4567");
    }

    #[test]
    fn test_sections_always_missing() {
        let fields = parse_resume_heuristically(RESUME);
        assert!(fields.skills.is_empty());
        assert_eq!(fields.missing_info, vec!["skills", "experience", "education"]);
    }

    #[test]
    fn test_blank_resume_yields_empty_contact() {
        let fields = parse_resume_heuristically("\n   \n");
        assert!(fields.name.is_empty());
        assert!(fields.email.is_empty());
        assert!(fields.phone.is_empty());
    }

    #[test]
    fn test_international_prefix_phone() {
        let fields = parse_resume_heuristically("Alan Turing\n+1 555.987.6543\n");
        assert_eq!(fields.phone, "+1 555.987.6543");
    }
}
