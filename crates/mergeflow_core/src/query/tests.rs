use super::*;
use crate::models::Document;
use crate::table::TableState;
use crate::test_support::{at_millis, file_at, folders_and_files, sample_members};
use std::collections::BTreeSet;

fn ids<R: Filterable>(view: &FilteredView<'_, R>) -> Vec<String> {
    view.ids()
}

fn by_name<R: Filterable>() -> impl Fn(&R, &R) -> Ordering {
    get_comparator(Order::Asc, "name")
}

#[test]
fn sort_is_stable_for_duplicate_keys() {
    let docs = vec![
        Document::file("a", "same", "txt"),
        Document::file("b", "alpha", "txt"),
        Document::file("c", "same", "txt"),
        Document::file("d", "same", "txt"),
    ];

    let asc = apply_filter(Some(&docs), get_comparator(Order::Asc, "name"), &FilterCriteria::new());
    assert_eq!(ids(&asc), ["b", "a", "c", "d"]);

    let desc = apply_filter(Some(&docs), get_comparator(Order::Desc, "name"), &FilterCriteria::new());
    assert_eq!(ids(&desc), ["a", "c", "d", "b"]);
}

#[test]
fn sort_and_filter_is_idempotent() {
    let docs = vec![
        file_at("a", "Plan", "docx", 3),
        file_at("b", "plan", "pdf", 1),
        file_at("c", "Budget", "xlsx", 2),
        file_at("d", "Plan", "png", 2),
    ];
    let criteria = FilterCriteria::new().with_name("PLAN");
    let comparator = get_comparator::<Document>(Order::Desc, "dateCreated");

    let first = apply_filter(Some(&docs), &comparator, &criteria);
    let once: Vec<Document> = first.rows.iter().map(|doc| (*doc).clone()).collect();
    let second = apply_filter(Some(&once), &comparator, &criteria);

    assert_eq!(ids(&first), ["a", "d", "b"]);
    assert_eq!(ids(&first), ids(&second));
}

#[test]
fn missing_sort_field_sorts_first_ascending() {
    let mut docs = folders_and_files(0, 3);
    docs[1].size = Some(5);
    let view = apply_filter(Some(&docs), get_comparator(Order::Asc, "size"), &FilterCriteria::new());
    assert_eq!(ids(&view), ["d0", "d2", "d1"]);

    let view = apply_filter(Some(&docs), get_comparator(Order::Desc, "size"), &FilterCriteria::new());
    assert_eq!(ids(&view), ["d1", "d0", "d2"]);

    let view = apply_filter(Some(&docs), get_comparator(Order::Asc, "unknown"), &FilterCriteria::new());
    assert_eq!(ids(&view), ["d0", "d1", "d2"]);
}

#[test]
fn size_sort_over_folders_and_files_is_total() {
    let mut docs = Vec::new();
    let mut seed: u64 = 17;
    for idx in 0..60 {
        if idx % 3 == 0 {
            docs.push(Document::folder(format!("f{idx}"), format!("Folder {idx}")));
        } else {
            seed = seed.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            let mut doc = Document::file(format!("d{idx}"), format!("note-{idx}.txt"), "txt");
            doc.size = Some((seed >> 33) % 1_000);
            docs.push(doc);
        }
    }

    let asc = apply_filter(Some(&docs), get_comparator(Order::Asc, "size"), &FilterCriteria::new());
    assert_eq!(asc.rows.len(), 60);
    assert!(asc.rows[..20].iter().all(|doc| doc.size.is_none()));
    assert!(asc.rows[20..].windows(2).all(|pair| pair[0].size <= pair[1].size));
    let folder_ids: Vec<String> = asc.rows[..20].iter().map(|doc| doc.id.clone()).collect();
    let expected: Vec<String> = (0..60).step_by(3).map(|idx| format!("f{idx}")).collect();
    assert_eq!(folder_ids, expected);

    let desc = apply_filter(Some(&docs), get_comparator(Order::Desc, "size"), &FilterCriteria::new());
    assert!(desc.rows[40..].iter().all(|doc| doc.size.is_none()));
    assert!(desc.rows[..40].windows(2).all(|pair| pair[0].size >= pair[1].size));
}

#[test]
fn absent_records_yield_empty_view() {
    let view = apply_filter::<Document, _>(None, by_name(), &FilterCriteria::new());
    assert!(view.is_empty());
    assert!(!view.is_not_found);
    assert!(!view.is_filtered);
}

#[test]
fn combined_criteria_equal_intersection() {
    let docs = vec![
        file_at("a", "Roadmap", "docx", 100),
        file_at("b", "roadmap draft", "pdf", 200),
        file_at("c", "Budget", "docx", 150),
        file_at("d", "ROADMAP final", "doc", 400),
        file_at("e", "Roadmap old", "docx", 50),
    ];
    let name = FilterCriteria::new().with_name("roadmap");
    let types = FilterCriteria::new().with_types(["word"]);
    let dates = FilterCriteria::new().with_date_range(Some(at_millis(60)), Some(at_millis(450)));

    let as_set = |criteria: &FilterCriteria| -> BTreeSet<String> {
        apply_filter(Some(&docs), by_name(), criteria)
            .ids()
            .into_iter()
            .collect()
    };

    let combined = FilterCriteria {
        name: name.name.clone(),
        types: types.types.clone(),
        start_date: dates.start_date,
        end_date: dates.end_date,
        ..FilterCriteria::default()
    };
    let expected: BTreeSet<String> = as_set(&name)
        .intersection(&as_set(&types))
        .cloned()
        .collect::<BTreeSet<_>>()
        .intersection(&as_set(&dates))
        .cloned()
        .collect();

    assert_eq!(as_set(&combined), expected);
    assert_eq!(expected, BTreeSet::from(["a".to_string(), "d".to_string()]));
}

#[test]
fn date_range_is_inclusive_at_both_bounds() {
    let docs = vec![
        file_at("before", "x", "txt", 999),
        file_at("start", "x", "txt", 1_000),
        file_at("middle", "x", "txt", 1_500),
        file_at("end", "x", "txt", 2_000),
        file_at("after", "x", "txt", 2_001),
        Document::file("undated", "x", "txt"),
    ];
    let criteria = FilterCriteria::new().with_date_range(Some(at_millis(1_000)), Some(at_millis(2_000)));

    let view = apply_filter(Some(&docs), by_name(), &criteria);
    assert_eq!(ids(&view), ["start", "middle", "end"]);
}

#[test]
fn incomplete_or_inverted_range_does_not_constrain() {
    let docs = vec![file_at("a", "x", "txt", 10), file_at("b", "x", "txt", 20)];

    let only_start = FilterCriteria::new().with_date_range(Some(at_millis(15)), None);
    let view = apply_filter(Some(&docs), by_name(), &only_start);
    assert_eq!(view.len(), 2);
    assert!(view.is_filtered);

    let inverted = FilterCriteria::new().with_date_range(Some(at_millis(30)), Some(at_millis(5)));
    assert!(inverted.date_error);
    assert_eq!(apply_filter(Some(&docs), by_name(), &inverted).len(), 2);

    let mut flagged = FilterCriteria::new().with_date_range(Some(at_millis(0)), Some(at_millis(15)));
    flagged.date_error = true;
    assert_eq!(apply_filter(Some(&docs), by_name(), &flagged).len(), 2);
}

#[test]
fn folder_filter_fills_first_page() {
    let docs = folders_and_files(12, 8);
    let mut criteria = FilterCriteria::new();
    criteria.toggle_type("folder");

    let view = apply_filter(Some(&docs), get_comparator(Order::Asc, "type"), &criteria);
    assert_eq!(view.len(), 12);
    assert!(!view.is_not_found);

    let table = TableState::new(10);
    let page = table.page_slice(&view.rows);
    assert_eq!(page.len(), 10);
    assert!(page.iter().all(|doc| doc.is_folder()));

    criteria.name = "zzz".to_string();
    let view = apply_filter(Some(&docs), by_name(), &criteria);
    assert!(view.is_empty());
    assert!(view.is_not_found);
    assert!(view.is_filtered);
}

#[test]
fn toggle_type_adds_and_removes() {
    let mut criteria = FilterCriteria::new();
    criteria.toggle_type("Image");
    criteria.toggle_type("pdf");
    assert_eq!(criteria.types.len(), 2);
    criteria.toggle_type("image");
    assert_eq!(criteria.types.iter().collect::<Vec<_>>(), ["pdf"]);
    criteria.clear();
    assert!(!criteria.is_filtered());
}

#[test]
fn role_filter_matches_case_insensitively() {
    let members = sample_members();

    let leaders = apply_filter(Some(&members), by_name(), &FilterCriteria::new().with_role("LEADER"));
    assert_eq!(ids(&leaders), ["m1", "m3"]);

    let all = apply_filter(Some(&members), by_name(), &FilterCriteria::new().with_role("all"));
    assert_eq!(all.len(), members.len());
    assert!(!all.is_filtered);

    let none = apply_filter(Some(&members), by_name(), &FilterCriteria::new().with_role("hr"));
    assert!(none.is_not_found);
}

#[test]
fn order_round_trips_through_strings() {
    assert_eq!("DESC".parse::<Order>(), Ok(Order::Desc));
    assert_eq!(Order::Asc.flipped(), Order::Desc);
    assert_eq!(Order::Desc.to_string(), "desc");
    assert!("sideways".parse::<Order>().is_err());
}
