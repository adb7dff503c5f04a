use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::domain::headers::{CanonicalField, CANONICAL_FIELDS};

const EXAMPLE_ROWS: [[(CanonicalField, &str); 6]; 3] = [
    [
        (CanonicalField::Name, "John Smith"),
        (CanonicalField::Email, "john@example.com"),
        (CanonicalField::CvUrl, "https://example.com/john-cv.pdf"),
        (CanonicalField::Phone, "+1-555-0101"),
        (CanonicalField::ExperienceYears, "5"),
        (CanonicalField::Status, "applied"),
    ],
    [
        (CanonicalField::Name, "Jane Doe"),
        (CanonicalField::Email, "jane@example.com"),
        (CanonicalField::CvUrl, "https://example.com/jane-cv.pdf"),
        (CanonicalField::Phone, "+1-555-0102"),
        (CanonicalField::ExperienceYears, "3"),
        (CanonicalField::Status, "applied"),
    ],
    [
        (CanonicalField::Name, "Mike Johnson"),
        (CanonicalField::Email, "mike@example.com"),
        (CanonicalField::CvUrl, "https://example.com/mike-cv.pdf"),
        (CanonicalField::Phone, "+1-555-0103"),
        (CanonicalField::ExperienceYears, "7"),
        (CanonicalField::Status, "applied"),
    ],
];

/// Header row plus sample candidates, one record per row, in canonical column order.
pub fn template_records() -> Vec<Vec<String>> {
    let mut records = vec![CANONICAL_FIELDS
        .iter()
        .map(|field| field.key().to_string())
        .collect::<Vec<_>>()];

    for example in &EXAMPLE_ROWS {
        records.push(
            CANONICAL_FIELDS
                .iter()
                .map(|field| {
                    example
                        .iter()
                        .find(|(candidate, _)| candidate == field)
                        .map(|(_, value)| value.to_string())
                        .unwrap_or_default()
                })
                .collect(),
        );
    }
    records
}

pub fn write_template<W: Write>(out: W) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in template_records() {
        writer
            .write_record(&record)
            .context("failed to write template row")?;
    }
    writer.flush().context("failed to flush template")?;
    Ok(())
}

pub fn save_template(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create template: {}", path.display()))?;
    write_template(file)
}
