use chrono::NaiveDate;
use proptest::prelude::*;

/// Node count and forward edges `(i, j)` with `i < j`
pub fn forward_dag_strategy() -> impl Strategy<Value = (usize, Vec<(usize, usize)>)> {
    (2usize..12).prop_flat_map(|nodes| {
        let edge = (0..nodes - 1).prop_flat_map(move |from| (Just(from), from + 1..nodes));
        (Just(nodes), prop::collection::vec(edge, 0..30))
    })
}

/// Dates across several centuries, leap days included
pub fn logical_date_strategy() -> impl Strategy<Value = NaiveDate> {
    (1900i32..=2200, 1u32..=366).prop_filter_map("valid ordinal", |(year, ordinal)| {
        NaiveDate::from_yo_opt(year, ordinal)
    })
}

pub fn node_name(index: usize) -> String {
    format!("task-{index:02}")
}
