use std::path::PathBuf;

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};

use crate::usecase::services::import_service::ACCEPTED_EXTENSIONS;

pub fn pick_candidate_files() -> Vec<PathBuf> {
    FileDialog::new()
        .add_filter("Candidate files", &ACCEPTED_EXTENSIONS)
        .add_filter("CSV", &["csv"])
        .add_filter("Excel", &["xlsx", "xls"])
        .add_filter("PDF", &["pdf"])
        .pick_files()
        .unwrap_or_default()
}

pub fn pick_template_destination() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("CSV", &["csv"])
        .set_file_name("candidate_upload_template.csv")
        .save_file()
}

pub fn confirm_clear_all(file_count: usize, row_count: usize) -> bool {
    let confirm = MessageDialog::new()
        .set_level(MessageLevel::Warning)
        .set_title("Clear all")
        .set_description(format!(
            "Discard {file_count} file(s) and {row_count} unsaved row(s) and start over?"
        ))
        .set_buttons(MessageButtons::YesNo)
        .show();
    confirm == MessageDialogResult::Yes
}
