//! Derivation of the visible projection from a collection and its criteria.
//!
//! The projection is a pure function of its inputs and is always recomputed
//! from scratch. Sorting uses the standard library's stable sort, so records
//! with equal sort keys keep their relative collection order in both
//! directions and across recomputations.

use crate::criteria::Criteria;
use crate::record::Record;

pub fn matches_text<R: Record>(record: &R, needle: &str) -> bool {
    record
        .search_fields()
        .into_iter()
        .any(|field| field.to_lowercase().contains(needle))
}

pub fn matches<R: Record>(record: &R, criteria: &Criteria<R>, needle: Option<&str>) -> bool {
    if let Some(needle) = needle
        && !matches_text(record, needle)
    {
        return false;
    }
    if !record.matches_preset(criteria.preset) {
        return false;
    }
    match criteria.status_filter {
        Some(status) => record.status() == status,
        None => true,
    }
}

/// Filter then stable-sort `items` according to `criteria`.
pub fn project<R: Record>(items: &[R], criteria: &Criteria<R>) -> Vec<R> {
    let needle = criteria.needle();
    let mut visible: Vec<R> = items
        .iter()
        .filter(|record| matches(*record, criteria, needle.as_deref()))
        .cloned()
        .collect();
    let field = criteria.sort_field;
    let direction = criteria.sort_direction;
    visible.sort_by(|a, b| direction.apply(a.compare_by(b, field)));
    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::inquiry::{Inquiry, InquiryPreset, InquirySortField, InquiryStatus, Urgency};
    use crate::record::SortDirection;

    fn inquiry(id: &str, name: &str, urgency: Urgency) -> Inquiry {
        Inquiry::sample(id, name, urgency)
    }

    fn scenario() -> Vec<Inquiry> {
        vec![
            inquiry("i-1", "Ada Lovelace", Urgency::Low),
            inquiry("i-2", "Grace Hopper", Urgency::Urgent),
            inquiry("i-3", "Alan Turing", Urgency::Medium),
        ]
    }

    fn ids(items: &[Inquiry]) -> Vec<&str> {
        items.iter().map(|i| i.id.as_str()).collect()
    }

    #[test]
    fn test_high_priority_preset_then_urgency_sort() {
        let items = scenario();

        let criteria = Criteria::<Inquiry>::new().with_preset(InquiryPreset::HighPriority);
        assert_eq!(ids(&project(&items, &criteria)), vec!["i-2"]);

        let criteria = Criteria::<Inquiry>::new()
            .with_sort(InquirySortField::Urgency, SortDirection::Descending);
        let sorted = project(&items, &criteria);
        let urgencies: Vec<Urgency> = sorted.iter().map(|i| i.urgency).collect();
        assert_eq!(urgencies, vec![Urgency::Urgent, Urgency::Medium, Urgency::Low]);
    }

    #[test]
    fn test_search_is_case_insensitive_over_fixed_fields() {
        let items = scenario();
        let criteria = Criteria::<Inquiry>::new().with_search("  HOPPER ");
        assert_eq!(ids(&project(&items, &criteria)), vec!["i-2"]);

        let criteria = Criteria::<Inquiry>::new().with_search("nobody");
        assert!(project(&items, &criteria).is_empty());
    }

    #[test]
    fn test_status_filter() {
        let mut items = scenario();
        items[0].status = InquiryStatus::Contacted;
        let criteria = Criteria::<Inquiry>::new().with_status(Some(InquiryStatus::Contacted));
        assert_eq!(ids(&project(&items, &criteria)), vec!["i-1"]);
    }

    #[test]
    fn test_equal_keys_keep_collection_order() {
        let items = vec![
            inquiry("a", "Same", Urgency::High),
            inquiry("b", "Same", Urgency::High),
            inquiry("c", "Same", Urgency::Low),
            inquiry("d", "Same", Urgency::High),
        ];
        let asc = Criteria::<Inquiry>::new()
            .with_sort(InquirySortField::Urgency, SortDirection::Ascending);
        assert_eq!(ids(&project(&items, &asc)), vec!["c", "a", "b", "d"]);

        let desc = Criteria::<Inquiry>::new()
            .with_sort(InquirySortField::Urgency, SortDirection::Descending);
        assert_eq!(ids(&project(&items, &desc)), vec!["a", "b", "d", "c"]);
    }

    #[test]
    fn test_projection_is_pure() {
        let items = scenario();
        let criteria = Criteria::<Inquiry>::new()
            .with_search("a")
            .with_sort(InquirySortField::Name, SortDirection::Descending);
        let first = project(&items, &criteria);
        for _ in 0..5 {
            assert_eq!(project(&items, &criteria), first);
        }
        assert_eq!(ids(&items), vec!["i-1", "i-2", "i-3"]);
    }

    #[test]
    fn test_is_filtering_ignores_sort_and_blank_search() {
        let criteria = Criteria::<Inquiry>::new()
            .with_search("   ")
            .with_sort(InquirySortField::Name, SortDirection::Descending);
        assert!(!criteria.is_filtering());

        assert!(Criteria::<Inquiry>::new().with_search("ada").is_filtering());
        assert!(
            Criteria::<Inquiry>::new()
                .with_status(Some(InquiryStatus::New))
                .is_filtering()
        );
        assert!(
            Criteria::<Inquiry>::new()
                .with_preset(InquiryPreset::HighPriority)
                .is_filtering()
        );
    }
}
