//! Purpose: Filter and sort an in-memory JSON dataset by colon-delimited directives.
//! Exports: `Query`, `apply`.
//! Role: Pure query processing; no I/O, no retained state across calls.
//! Invariants: Validation is fail-fast; the first invalid element aborts the whole operation.
//! Invariants: The sort is stable; elements equal under the sort key keep their relative order.

use std::cmp::Ordering;

use serde_json::Value;

use crate::core::error::{Error, ErrorKind};

/// Caller-supplied filter/sort directives, both optional.
///
/// `filter` is `key:value` (exact match, case-insensitive on the value);
/// `sort` is `key:asc` or `key:desc`.
#[derive(Clone, Debug, Default)]
pub struct Query {
    pub filter: Option<String>,
    pub sort: Option<String>,
}

impl Query {
    pub fn is_empty(&self) -> bool {
        self.filter.is_none() && self.sort.is_none()
    }
}

/// Apply `query` to `data`, filtering first, then sorting.
///
/// An empty result is a valid return value; surfacing "no matches" is the
/// caller's concern.
pub fn apply(data: Vec<Value>, query: &Query) -> Result<Vec<Value>, Error> {
    let mut records = data;
    if let Some(directive) = query.filter.as_deref() {
        records = filter_records(records, directive)?;
    }
    if let Some(directive) = query.sort.as_deref() {
        records = sort_records(records, directive)?;
    }
    Ok(records)
}

fn filter_records(records: Vec<Value>, directive: &str) -> Result<Vec<Value>, Error> {
    let (key, value) = split_directive(directive);
    if key.is_empty() || value.is_empty() {
        return Err(Error::new(ErrorKind::InvalidFilterFormat)
            .with_message("invalid filter format")
            .with_hint("Use key:value, e.g. filter=status:active."));
    }
    let wanted = value.to_lowercase();

    let mut kept = Vec::new();
    for record in records {
        let Some(field) = record.as_object().and_then(|map| map.get(key)) else {
            return Err(Error::new(ErrorKind::MissingFilterKey)
                .with_message(format!("filter key \"{key}\" does not exist in data")));
        };
        let matched = field_matches(field, &wanted);
        if matched {
            kept.push(record);
        }
    }
    Ok(kept)
}

fn sort_records(records: Vec<Value>, directive: &str) -> Result<Vec<Value>, Error> {
    let (key, order) = split_directive(directive);
    if key.is_empty() || order.is_empty() {
        return Err(Error::new(ErrorKind::InvalidSortFormat)
            .with_message("invalid sort format")
            .with_hint("Use key:order where order is asc or desc."));
    }
    let descending = match order {
        "asc" => false,
        "desc" => true,
        _ => {
            return Err(Error::new(ErrorKind::InvalidSortOrder)
                .with_message("invalid sort order, use \"asc\" or \"desc\""));
        }
    };

    // Key presence is checked for every element up front so a single
    // offending record fails the operation even when no comparison runs.
    let mut decorated = Vec::with_capacity(records.len());
    for record in records {
        let Some(field) = record.as_object().and_then(|map| map.get(key)) else {
            return Err(Error::new(ErrorKind::MissingSortKey)
                .with_message(format!("sort key \"{key}\" does not exist in data")));
        };
        let field = field.clone();
        decorated.push((record, field));
    }

    decorated.sort_by(|(_, a), (_, b)| {
        let ordering = compare_values(a, b);
        if descending { ordering.reverse() } else { ordering }
    });

    Ok(decorated.into_iter().map(|(record, _)| record).collect())
}

/// First two colon-separated segments of a directive; trailing segments are
/// ignored, absent segments come back empty.
fn split_directive(directive: &str) -> (&str, &str) {
    let mut parts = directive.split(':');
    let key = parts.next().unwrap_or("");
    let value = parts.next().unwrap_or("");
    (key, value)
}

/// Exact, case-insensitive match against a record field. Falsy values
/// (null, false, empty string, zero) never match; truthy non-string scalars
/// compare by their display form; arrays and objects never match.
fn field_matches(field: &Value, wanted_lower: &str) -> bool {
    match field {
        Value::String(text) => !text.is_empty() && text.to_lowercase() == wanted_lower,
        Value::Number(number) => {
            number.as_f64() != Some(0.0) && number.to_string() == wanted_lower
        }
        Value::Bool(true) => wanted_lower == "true",
        _ => false,
    }
}

/// Three-way comparison with native ordering inside each JSON type; mixed
/// types order by a fixed kind rank so the rule stays consistent.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => kind_rank(a).cmp(&kind_rank(b)),
    }
}

fn kind_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

#[cfg(test)]
mod tests {
    use super::{Query, apply};
    use crate::core::error::ErrorKind;
    use serde_json::{Value, json};

    fn records(value: Value) -> Vec<Value> {
        value.as_array().expect("array").clone()
    }

    fn query(filter: Option<&str>, sort: Option<&str>) -> Query {
        Query {
            filter: filter.map(str::to_string),
            sort: sort.map(str::to_string),
        }
    }

    #[test]
    fn empty_query_returns_data_unchanged() {
        let data = records(json!([{"id": 2}, {"id": 1}, {"id": 3}]));
        let out = apply(data.clone(), &Query::default()).expect("apply");
        assert_eq!(out, data);
    }

    #[test]
    fn filter_keeps_exact_matches() {
        let data = records(json!([
            {"id": 1, "status": "active"},
            {"id": 2, "status": "inactive"}
        ]));
        let out = apply(data, &query(Some("status:active"), None)).expect("apply");
        assert_eq!(out, records(json!([{"id": 1, "status": "active"}])));
    }

    #[test]
    fn filter_value_is_case_insensitive() {
        let data = records(json!([{"status": "active"}, {"status": "retired"}]));
        let out = apply(data, &query(Some("status:Active"), None)).expect("apply");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["status"], "active");
    }

    #[test]
    fn filter_ignores_segments_after_the_second() {
        let data = records(json!([{"note": "a"}, {"note": "b"}]));
        let out = apply(data, &query(Some("note:a:extra"), None)).expect("apply");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["note"], "a");
    }

    #[test]
    fn filter_without_value_is_invalid_format() {
        let data = records(json!([{"status": "active"}]));
        let err = apply(data, &query(Some("status"), None)).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidFilterFormat);
    }

    #[test]
    fn filter_with_empty_key_is_invalid_format() {
        let data = records(json!([{"status": "active"}]));
        let err = apply(data, &query(Some(":active"), None)).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidFilterFormat);
    }

    #[test]
    fn filter_missing_key_fails_fast() {
        let data = records(json!([{"id": 1}]));
        let err = apply(data, &query(Some("missing:foo"), None)).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MissingFilterKey);
    }

    #[test]
    fn filter_missing_key_aborts_before_keeping_matches() {
        let data = records(json!([
            {"status": "active"},
            {"id": 2}
        ]));
        let err = apply(data, &query(Some("status:active"), None)).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MissingFilterKey);
    }

    #[test]
    fn filter_treats_falsy_values_as_non_matching() {
        let data = records(json!([
            {"flag": null},
            {"flag": false},
            {"flag": ""},
            {"flag": 0},
            {"flag": "false"}
        ]));
        let out = apply(data, &query(Some("flag:false"), None)).expect("apply");
        assert_eq!(out, records(json!([{"flag": "false"}])));
    }

    #[test]
    fn filter_matches_truthy_scalars_by_display_form() {
        let data = records(json!([{"n": 42}, {"n": 7}, {"n": true}]));
        let out = apply(data, &query(Some("n:42"), None)).expect("apply");
        assert_eq!(out, records(json!([{"n": 42}])));
    }

    #[test]
    fn sort_ascending_by_numeric_key() {
        let data = records(json!([{"id": 2}, {"id": 1}]));
        let out = apply(data, &query(None, Some("id:asc"))).expect("apply");
        assert_eq!(out, records(json!([{"id": 1}, {"id": 2}])));
    }

    #[test]
    fn sort_desc_reverses_asc_for_distinct_keys() {
        let data = records(json!([{"id": 3}, {"id": 1}, {"id": 2}]));
        let asc = apply(data.clone(), &query(None, Some("id:asc"))).expect("asc");
        let mut desc = apply(data, &query(None, Some("id:desc"))).expect("desc");
        desc.reverse();
        assert_eq!(asc, desc);
    }

    #[test]
    fn sort_is_stable_for_equal_keys() {
        let data = records(json!([
            {"rank": 1, "tag": "first"},
            {"rank": 0, "tag": "zero"},
            {"rank": 1, "tag": "second"}
        ]));
        let out = apply(data, &query(None, Some("rank:asc"))).expect("apply");
        assert_eq!(out[0]["tag"], "zero");
        assert_eq!(out[1]["tag"], "first");
        assert_eq!(out[2]["tag"], "second");
    }

    #[test]
    fn sort_strings_lexicographically() {
        let data = records(json!([{"name": "carol"}, {"name": "alice"}, {"name": "bob"}]));
        let out = apply(data, &query(None, Some("name:asc"))).expect("apply");
        let names: Vec<&str> = out.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, ["alice", "bob", "carol"]);
    }

    #[test]
    fn sort_order_must_be_asc_or_desc() {
        let data = records(json!([{"id": 1}]));
        let err = apply(data, &query(None, Some("id:ascending"))).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidSortOrder);
    }

    #[test]
    fn sort_order_is_case_sensitive() {
        let data = records(json!([{"id": 1}]));
        let err = apply(data, &query(None, Some("id:ASC"))).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidSortOrder);
    }

    #[test]
    fn sort_without_order_is_invalid_format() {
        let data = records(json!([{"id": 1}]));
        let err = apply(data, &query(None, Some("id"))).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::InvalidSortFormat);
    }

    #[test]
    fn sort_missing_key_fails_fast() {
        let data = records(json!([{"id": 1}, {"other": 2}]));
        let err = apply(data, &query(None, Some("id:asc"))).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::MissingSortKey);
    }

    #[test]
    fn filter_runs_before_sort() {
        // The record lacking "id" is filtered out before the sort key check.
        let data = records(json!([
            {"kind": "a", "id": 2},
            {"kind": "b"},
            {"kind": "a", "id": 1}
        ]));
        let out = apply(data, &query(Some("kind:a"), Some("id:asc"))).expect("apply");
        assert_eq!(out, records(json!([{"kind": "a", "id": 1}, {"kind": "a", "id": 2}])));
    }

    #[test]
    fn mixed_type_sort_is_consistent() {
        let data = records(json!([{"v": "text"}, {"v": 3}, {"v": null}, {"v": true}]));
        let out = apply(data, &query(None, Some("v:asc"))).expect("apply");
        assert_eq!(out[0]["v"], json!(null));
        assert_eq!(out[1]["v"], json!(true));
        assert_eq!(out[2]["v"], json!(3));
        assert_eq!(out[3]["v"], json!("text"));
    }

    #[test]
    fn apply_is_idempotent_on_its_output() {
        let data = records(json!([
            {"id": 3, "status": "active"},
            {"id": 1, "status": "active"},
            {"id": 2, "status": "idle"}
        ]));
        let q = query(Some("status:active"), Some("id:asc"));
        let once = apply(data, &q).expect("once");
        let twice = apply(once.clone(), &q).expect("twice");
        assert_eq!(once, twice);
    }

    #[test]
    fn empty_result_is_not_an_error() {
        let data = records(json!([{"status": "idle"}]));
        let out = apply(data, &query(Some("status:active"), None)).expect("apply");
        assert!(out.is_empty());
    }
}
