use super::record::{CellValue, PostRecord, RawRow};

/// Header synonyms and the canonical field each one maps to
const COLUMN_MAPPINGS: &[(&str, &str)] = &[
    ("reel", "url"),
    ("post_url", "url"),
    ("link", "url"),
    ("views", "view_count"),
    ("view_count", "view_count"),
    ("likes", "like_count"),
    ("like_count", "like_count"),
    ("comments", "comment_count"),
    ("comment_count", "comment_count"),
    ("profile", "profile_name"),
    ("username", "profile_name"),
    ("account", "profile_name"),
];

/// Map a header to its canonical name. Lookup is case-insensitive; unknown
/// headers come back lower-cased.
pub fn canonical_column(header: &str) -> String {
    let lowered = header.trim().to_lowercase();
    COLUMN_MAPPINGS
        .iter()
        .find(|(synonym, _)| *synonym == lowered)
        .map(|(_, canonical)| canonical.to_string())
        .unwrap_or(lowered)
}

/// Normalize one row. When two columns land on the same canonical field the
/// later column wins.
pub fn normalize_row(row: &RawRow) -> PostRecord {
    let mut record = PostRecord::default();

    for (header, value) in row {
        let key = canonical_column(header);
        match key.as_str() {
            "url" => record.url = value.as_text(),
            "view_count" => record.view_count = present(value),
            "like_count" => record.like_count = present(value),
            "comment_count" => record.comment_count = present(value),
            "profile_name" => record.profile_name = value.as_text(),
            _ => {
                if let Some(slot) = record.extra.iter_mut().find(|(k, _)| *k == key) {
                    slot.1 = value.clone();
                } else {
                    record.extra.push((key, value.clone()));
                }
            }
        }
    }

    record
}

/// Normalize every row of a table
pub fn normalize_rows(rows: &[RawRow]) -> Vec<PostRecord> {
    rows.iter().map(normalize_row).collect()
}

fn present(value: &CellValue) -> Option<CellValue> {
    if value.is_empty() {
        None
    } else {
        Some(value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[(&str, &str)]) -> RawRow {
        cells
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_synonyms_map_case_insensitively() {
        assert_eq!(canonical_column("Reel"), "url");
        assert_eq!(canonical_column("POST_URL"), "url");
        assert_eq!(canonical_column("Link"), "url");
        assert_eq!(canonical_column("Views"), "view_count");
        assert_eq!(canonical_column("Likes"), "like_count");
        assert_eq!(canonical_column("Comments"), "comment_count");
        assert_eq!(canonical_column("Username"), "profile_name");
        assert_eq!(canonical_column("Account"), "profile_name");
        assert_eq!(canonical_column("Caption"), "caption");
    }

    #[test]
    fn test_normalize_row_builds_record() {
        let record = normalize_row(&row(&[
            ("Profile", "alice"),
            ("Reel", "https://www.instagram.com/reel/ABC/"),
            ("Views", "1,000"),
            ("Likes", "10"),
            ("Caption", "hello"),
        ]));

        assert_eq!(record.profile_name.as_deref(), Some("alice"));
        assert_eq!(record.url(), Some("https://www.instagram.com/reel/ABC/"));
        assert_eq!(record.view_count, Some(CellValue::Text("1,000".into())));
        assert_eq!(record.comment_count, None);
        assert_eq!(
            record.extra,
            vec![("caption".to_string(), CellValue::Text("hello".into()))]
        );
    }

    #[test]
    fn test_last_column_wins_on_conflict() {
        let record = normalize_row(&row(&[
            ("Views", "5"),
            ("view_count", "9"),
            ("Link", "https://a"),
            ("Reel", "https://b"),
        ]));

        assert_eq!(record.view_count, Some(CellValue::Text("9".into())));
        assert_eq!(record.url.as_deref(), Some("https://b"));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let rows = vec![
            row(&[("Reel", "https://x/reel/1/"), ("Views", "3"), ("Notes", "n")]),
            row(&[("Link", "https://x/p/2/"), ("Comments", ""), ("Account", "bob")]),
        ];

        let once = normalize_rows(&rows);
        let round_tripped: Vec<RawRow> = once.iter().map(PostRecord::to_row).collect();
        let twice = normalize_rows(&round_tripped);

        assert_eq!(once, twice);
    }
}
