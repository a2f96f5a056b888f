//! Dataset Module Tests
//!
//! ## Test Scopes
//! - **Loader**: header handling, malformed-row skipping, orientation.
//! - **Matrix**: transposition and deterministic record flattening.

#[cfg(test)]
mod tests {
    use crate::dataset::loader::{load_ratings, parse_ratings};
    use crate::dataset::types::{Orientation, RatingMatrix, RatingRecord};
    use crate::error::DatasetError;
    use std::io::Cursor;

    const SAMPLE: &str = "movie_id,customer_id,rating,date\n\
                          1,100,5,2005-01-01\n\
                          1,200,3,2005-01-02\n\
                          2,100,4,2005-01-03\n\
                          3,300,2,2005-01-04\n";

    // ============================================================
    // LOADER TESTS
    // ============================================================

    #[test]
    fn test_parse_skips_header_and_keys_by_subject() {
        let report = parse_ratings(Cursor::new(SAMPLE), Orientation::BySubject).unwrap();

        assert_eq!(report.rows, 4);
        assert_eq!(report.skipped, 0);
        assert_eq!(report.matrix.len(), 3, "Three distinct customers");
        assert_eq!(report.matrix.rating(100, 1), Some(5.0));
        assert_eq!(report.matrix.rating(100, 2), Some(4.0));
        assert_eq!(report.matrix.rating(300, 3), Some(2.0));
    }

    #[test]
    fn test_parse_by_item_orientation() {
        let report = parse_ratings(Cursor::new(SAMPLE), Orientation::ByItem).unwrap();

        assert_eq!(report.matrix.orientation(), Orientation::ByItem);
        assert_eq!(report.matrix.len(), 3, "Three distinct movies");
        assert_eq!(report.matrix.rating(1, 200), Some(3.0));
    }

    #[test]
    fn test_malformed_rows_are_skipped() {
        let csv = "item,subject,rating\n\
                   1,10,4.5\n\
                   not-a-number,10,3\n\
                   2,11\n\
                   \n\
                   3,12,NaN\n\
                   4,13,2.0\n";

        let report = parse_ratings(Cursor::new(csv), Orientation::BySubject).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped, 3, "Blank lines are ignored, not counted");
        assert_eq!(report.matrix.rating(13, 4), Some(2.0));
    }

    #[test]
    fn test_invalid_utf8_row_is_skipped() {
        let csv: &[u8] = b"header\r\n1,10,5.0\r\n2,\xff\xfe,4.0\n3,12,3.0\n";

        let report = parse_ratings(Cursor::new(csv), Orientation::BySubject).unwrap();

        assert_eq!(report.rows, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.matrix.rating(10, 1), Some(5.0));
        assert_eq!(report.matrix.rating(12, 3), Some(3.0));
    }

    #[test]
    fn test_empty_input_is_missing_header() {
        let result = parse_ratings(Cursor::new(""), Orientation::BySubject);
        assert!(matches!(result, Err(DatasetError::MissingHeader)));
    }

    #[test]
    fn test_header_only_gives_empty_matrix() {
        let report = parse_ratings(Cursor::new("a,b,c\n"), Orientation::BySubject).unwrap();
        assert!(report.matrix.is_empty());
        assert_eq!(report.rows, 0);
    }

    #[test]
    fn test_missing_file_reports_path() {
        let path = std::path::Path::new("/definitely/not/here.csv");
        let err = load_ratings(path, Orientation::BySubject).unwrap_err();

        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }

    // ============================================================
    // MATRIX TESTS
    // ============================================================

    #[test]
    fn test_transpose_round_trip() {
        let matrix = parse_ratings(Cursor::new(SAMPLE), Orientation::BySubject)
            .unwrap()
            .matrix;

        let by_item = matrix.transpose();
        assert_eq!(by_item.orientation(), Orientation::ByItem);
        assert_eq!(by_item.rating(1, 100), Some(5.0));
        assert_eq!(by_item.rating_count(), matrix.rating_count());

        assert_eq!(by_item.transpose(), matrix);
    }

    #[test]
    fn test_records_are_sorted_and_orientation_independent() {
        let by_subject = parse_ratings(Cursor::new(SAMPLE), Orientation::BySubject)
            .unwrap()
            .matrix;

        let records = by_subject.records();
        let keys: Vec<(u32, u32)> = records.iter().map(|r| (r.subject_id, r.item_id)).collect();
        assert_eq!(keys, vec![(100, 1), (100, 2), (200, 1), (300, 3)]);

        // Flattening the same ratings keyed by item yields the same set of records.
        let mut from_items = by_subject.transpose().records();
        let mut from_subjects = records.clone();
        from_items.sort_by_key(|r| (r.item_id, r.subject_id));
        from_subjects.sort_by_key(|r| (r.item_id, r.subject_id));
        assert_eq!(from_items, from_subjects);
    }

    #[test]
    fn test_duplicate_rating_overwrites() {
        let matrix = RatingMatrix::from_records(
            Orientation::BySubject,
            vec![
                RatingRecord { item_id: 1, subject_id: 9, rating: 1.0 },
                RatingRecord { item_id: 1, subject_id: 9, rating: 4.0 },
            ],
        );

        assert_eq!(matrix.rating_count(), 1);
        assert_eq!(matrix.rating(9, 1), Some(4.0));
    }
}
