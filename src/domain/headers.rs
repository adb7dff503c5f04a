use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    Name,
    Email,
    CvUrl,
    Phone,
    ExperienceYears,
    Status,
    Location,
    TechnicalSkills,
    Designation,
    EducationLevel,
}

/// Display order of the candidate grid.
pub const CANONICAL_FIELDS: [CanonicalField; 10] = [
    CanonicalField::Name,
    CanonicalField::Email,
    CanonicalField::CvUrl,
    CanonicalField::Phone,
    CanonicalField::ExperienceYears,
    CanonicalField::Status,
    CanonicalField::Location,
    CanonicalField::TechnicalSkills,
    CanonicalField::Designation,
    CanonicalField::EducationLevel,
];

pub const DEFAULT_STATUS: &str = "applied";

const HEADER_SYNONYMS: &[(&str, CanonicalField)] = &[
    ("name", CanonicalField::Name),
    ("full_name", CanonicalField::Name),
    ("candidate_name", CanonicalField::Name),
    ("email", CanonicalField::Email),
    ("e-mail", CanonicalField::Email),
    ("email_address", CanonicalField::Email),
    ("cv_url", CanonicalField::CvUrl),
    ("resume_url", CanonicalField::CvUrl),
    ("resume", CanonicalField::CvUrl),
    ("cv", CanonicalField::CvUrl),
    ("resume_path", CanonicalField::CvUrl),
    ("phone", CanonicalField::Phone),
    ("phone_number", CanonicalField::Phone),
    ("mobile", CanonicalField::Phone),
    ("contact", CanonicalField::Phone),
    ("experience_years", CanonicalField::ExperienceYears),
    ("experience", CanonicalField::ExperienceYears),
    ("years_of_experience", CanonicalField::ExperienceYears),
    ("exp", CanonicalField::ExperienceYears),
    ("status", CanonicalField::Status),
    ("application_status", CanonicalField::Status),
    ("location", CanonicalField::Location),
    ("city", CanonicalField::Location),
    ("address", CanonicalField::Location),
    ("skills", CanonicalField::TechnicalSkills),
    ("technical_skills", CanonicalField::TechnicalSkills),
    ("tech_skills", CanonicalField::TechnicalSkills),
    ("designation", CanonicalField::Designation),
    ("title", CanonicalField::Designation),
    ("seniority_level", CanonicalField::Designation),
    ("level", CanonicalField::Designation),
    ("education", CanonicalField::EducationLevel),
    ("education_level", CanonicalField::EducationLevel),
    ("qualification", CanonicalField::EducationLevel),
];

impl CanonicalField {
    pub fn key(self) -> &'static str {
        match self {
            CanonicalField::Name => "name",
            CanonicalField::Email => "email",
            CanonicalField::CvUrl => "cv_url",
            CanonicalField::Phone => "phone",
            CanonicalField::ExperienceYears => "experience_years",
            CanonicalField::Status => "status",
            CanonicalField::Location => "location",
            CanonicalField::TechnicalSkills => "technical_skills",
            CanonicalField::Designation => "designation",
            CanonicalField::EducationLevel => "education_level",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CanonicalField::Name => "Name",
            CanonicalField::Email => "Email",
            CanonicalField::CvUrl => "CV / Resume URL",
            CanonicalField::Phone => "Phone",
            CanonicalField::ExperienceYears => "Exp (years)",
            CanonicalField::Status => "Status",
            CanonicalField::Location => "Location",
            CanonicalField::TechnicalSkills => "Skills",
            CanonicalField::Designation => "Designation",
            CanonicalField::EducationLevel => "Education",
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, CanonicalField::Name | CanonicalField::Email)
    }

    pub fn index(self) -> usize {
        CANONICAL_FIELDS
            .iter()
            .position(|field| *field == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Maps a free-form column header onto a canonical key. Unknown headers come
/// back lower-cased with whitespace runs collapsed to `_`.
pub fn normalize_header(header: &str) -> String {
    let folded = header
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");

    HEADER_SYNONYMS
        .iter()
        .find(|(synonym, _)| *synonym == folded)
        .map(|(_, field)| field.key().to_string())
        .unwrap_or(folded)
}
