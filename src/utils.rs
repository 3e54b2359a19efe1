use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// Extracts the file extension from a filename and converts it to lowercase.
pub fn get_file_extension(filename: &str) -> Option<String> {
    Path::new(filename) // treats string as filesystem path.
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_lowercase())
}

/// Builds a collision-resistant object name: `{stem}_{YYYYMMDDhhmmss}_{8 hex}{.ext}`.
///
/// The original extension keeps its casing; any directory part of the
/// uploaded name (either separator style) is discarded.
pub fn generate_file_name(original_name: &str, now: DateTime<Utc>) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);

    let (stem, ext) = match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx..]),
        _ => (base, ""),
    };

    let timestamp = now.format("%Y%m%d%H%M%S");
    let suffix = Uuid::new_v4().simple().to_string();

    format!("{}_{}_{}{}", stem, timestamp, &suffix[..8], ext)
}

/// Normalizes a folder label into a relative path prefix.
///
/// Empty input falls back to `general`. Returns `None` when the folder would
/// escape the storage root.
pub fn normalize_folder(folder: &str) -> Option<String> {
    let trimmed = folder.trim().replace('\\', "/");
    let segments: Vec<&str> = trimmed
        .split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect();

    if segments.iter().any(|segment| *segment == "..") {
        return None;
    }

    if segments.is_empty() {
        Some("general".to_string())
    } else {
        Some(segments.join("/"))
    }
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn extension_is_lowercased() {
        assert_eq!(get_file_extension("Report.PDF"), Some("pdf".to_string()));
        assert_eq!(get_file_extension("archive.tar.gz"), Some("gz".to_string()));
        assert_eq!(get_file_extension("README"), None);
    }

    #[test]
    fn generated_name_keeps_stem_and_extension() {
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let name = generate_file_name("report.pdf", now);

        assert!(name.starts_with("report_20240309140507_"), "{name}");
        assert!(name.ends_with(".pdf"));
        let suffix = &name["report_20240309140507_".len()..name.len() - ".pdf".len()];
        assert_eq!(suffix.len(), 8);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generated_names_differ_within_the_same_second() {
        let now = Utc::now();
        assert_ne!(generate_file_name("a.txt", now), generate_file_name("a.txt", now));
    }

    #[test]
    fn generated_name_drops_client_directories() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let name = generate_file_name("../../etc/notes.txt", now);
        assert!(name.starts_with("notes_20240101000000_"));
        assert!(!name.contains('/'));
    }

    #[test]
    fn folder_normalization() {
        assert_eq!(normalize_folder(""), Some("general".to_string()));
        assert_eq!(normalize_folder("/avatars/"), Some("avatars".to_string()));
        assert_eq!(normalize_folder("docs\\2024"), Some("docs/2024".to_string()));
        assert_eq!(normalize_folder("a/../../b"), None);
    }

    #[test]
    fn dates_must_be_calendar_days() {
        assert_eq!(parse_date("2024-02-29"), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert_eq!(parse_date("2023-02-29"), None);
        assert_eq!(parse_date("29/02/2024"), None);
        assert_eq!(parse_date("2024-02-29T10:00:00"), None);
    }
}
