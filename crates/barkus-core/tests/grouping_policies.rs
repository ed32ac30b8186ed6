//! Grouping behavior for each no-barcode policy.

use barkus_core::{
    group_pages, DetectionStatus, GroupKey, NoBarcodePolicy, PageDetection,
};

fn success(page_index: usize, customer: &str, delivery: &str) -> PageDetection {
    PageDetection {
        page_index,
        customer_name: Some(customer.to_string()),
        delivery_number: Some(delivery.to_string()),
        status: DetectionStatus::Success,
        patterns_found: 2,
        readable_patterns: 2,
        retry_count: 0,
    }
}

fn no_barcode(page_index: usize) -> PageDetection {
    PageDetection {
        page_index,
        customer_name: None,
        delivery_number: None,
        status: DetectionStatus::NoPatternsFound,
        patterns_found: 0,
        readable_patterns: 0,
        retry_count: 0,
    }
}

fn key(customer: &str, delivery: &str) -> GroupKey {
    GroupKey::Barcodes {
        customer: customer.to_string(),
        delivery: delivery.to_string(),
    }
}

/// Two delivery orders with two unreadable pages between them.
fn mixed_document() -> Vec<PageDetection> {
    vec![
        success(0, "A", "1"),
        no_barcode(1),
        no_barcode(2),
        success(3, "B", "2"),
    ]
}

#[test]
fn ignore_drops_no_barcode_pages() {
    let groups = group_pages(&mixed_document(), NoBarcodePolicy::Ignore);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, key("A", "1"));
    assert_eq!(groups[0].page_indices, vec![0]);
    assert_eq!(groups[1].key, key("B", "2"));
    assert_eq!(groups[1].page_indices, vec![3]);
}

#[test]
fn separate_collects_them_into_a_trailing_group() {
    let groups = group_pages(&mixed_document(), NoBarcodePolicy::Separate);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[0].page_indices, vec![0]);
    assert_eq!(groups[1].page_indices, vec![3]);
    assert_eq!(groups[2].key, GroupKey::NoBarcode);
    assert_eq!(groups[2].page_indices, vec![1, 2]);
}

#[test]
fn keep_with_previous_attaches_to_the_last_group() {
    let groups = group_pages(&mixed_document(), NoBarcodePolicy::KeepWithPrevious);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].page_indices, vec![0, 1, 2]);
    assert_eq!(groups[1].page_indices, vec![3]);
}

#[test]
fn sequential_matches_keep_with_previous() {
    let a = group_pages(&mixed_document(), NoBarcodePolicy::Sequential);
    let b = group_pages(&mixed_document(), NoBarcodePolicy::KeepWithPrevious);
    assert_eq!(a, b);
}

#[test]
fn leading_no_barcode_pages_have_nowhere_to_attach() {
    let pages = vec![no_barcode(0), no_barcode(1), success(2, "A", "1")];
    let groups = group_pages(&pages, NoBarcodePolicy::KeepWithPrevious);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].page_indices, vec![2]);
}

#[test]
fn consecutive_pages_with_the_same_pair_share_a_group() {
    let pages = vec![
        success(0, "A", "1"),
        success(1, "A", "1"),
        success(2, "B", "2"),
    ];
    let groups = group_pages(&pages, NoBarcodePolicy::Ignore);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].page_indices, vec![0, 1]);
    assert_eq!(groups[1].page_indices, vec![2]);
}

#[test]
fn an_interruption_splits_a_repeated_pair_into_two_groups() {
    // The no-barcode page closes the run, so the same pair afterwards opens
    // a second group rather than merging back.
    let pages = vec![success(0, "A", "1"), no_barcode(1), success(2, "A", "1")];
    let groups = group_pages(&pages, NoBarcodePolicy::Ignore);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].key, groups[1].key);
    assert_eq!(groups[0].page_indices, vec![0]);
    assert_eq!(groups[1].page_indices, vec![2]);
}

#[test]
fn partial_detections_are_treated_as_no_barcode() {
    let mut partial = no_barcode(1);
    partial.status = DetectionStatus::PatternsUnreadable;
    partial.delivery_number = Some("DO5".to_string());
    partial.patterns_found = 2;
    partial.readable_patterns = 1;

    let pages = vec![success(0, "A", "1"), partial, success(2, "A", "1")];
    let groups = group_pages(&pages, NoBarcodePolicy::Separate);
    assert_eq!(groups.len(), 3);
    assert_eq!(groups[2].key, GroupKey::NoBarcode);
    assert_eq!(groups[2].page_indices, vec![1]);
}

#[test]
fn indices_stay_increasing_and_disjoint_under_every_policy() {
    let pages = vec![
        no_barcode(0),
        success(1, "A", "1"),
        success(2, "A", "1"),
        no_barcode(3),
        success(4, "A", "1"),
        no_barcode(5),
        no_barcode(6),
        success(7, "B", "2"),
        no_barcode(8),
    ];

    for policy in [
        NoBarcodePolicy::Ignore,
        NoBarcodePolicy::Separate,
        NoBarcodePolicy::KeepWithPrevious,
        NoBarcodePolicy::Sequential,
    ] {
        let groups = group_pages(&pages, policy);
        let mut seen = std::collections::HashSet::new();
        for group in &groups {
            assert!(
                group.page_indices.windows(2).all(|w| w[0] < w[1]),
                "{policy}: indices not strictly increasing: {:?}",
                group.page_indices
            );
            for &index in &group.page_indices {
                assert!(seen.insert(index), "{policy}: page {index} in two groups");
            }
        }
    }
}

#[test]
fn grouping_is_deterministic() {
    let pages = mixed_document();
    for policy in [
        NoBarcodePolicy::Ignore,
        NoBarcodePolicy::Separate,
        NoBarcodePolicy::KeepWithPrevious,
        NoBarcodePolicy::Sequential,
    ] {
        assert_eq!(group_pages(&pages, policy), group_pages(&pages, policy));
    }
}

#[test]
fn empty_input_yields_no_groups() {
    for policy in [NoBarcodePolicy::Ignore, NoBarcodePolicy::Separate] {
        assert!(group_pages(&[], policy).is_empty());
    }
}
