//! Property exclusion by serialization group and API version.
//!
//! Pure functions of (property, groups, version): nothing is cached between
//! generation passes.

use std::cmp::Ordering;

use super::metadata::PropertyMetadata;

/// Group a property belongs to when it declares none, and the group
/// requested when a definition asks for none.
pub const DEFAULT_GROUP: &str = "Default";

/// Whether `property` is serialized for any of the requested `groups`.
pub fn in_groups(property: &PropertyMetadata, groups: &[String]) -> bool {
    let requested = |group: &str| {
        if groups.is_empty() {
            group == DEFAULT_GROUP
        } else {
            groups.iter().any(|g| g == group)
        }
    };

    if property.groups.is_empty() {
        return requested(DEFAULT_GROUP);
    }
    property.groups.iter().any(|group| requested(group))
}

/// Whether `property` falls outside its `since`/`until` range for
/// `api_version`. No configured version means nothing is excluded.
pub fn excluded_by_version(property: &PropertyMetadata, api_version: Option<&str>) -> bool {
    let Some(version) = api_version else {
        return false;
    };
    if let Some(since) = &property.since_version
        && compare_versions(version, since) == Ordering::Less
    {
        return true;
    }
    if let Some(until) = &property.until_version
        && compare_versions(version, until) == Ordering::Greater
    {
        return true;
    }
    false
}

/// Compare dotted versions segment by segment. Numeric segments compare as
/// numbers, anything else lexically; missing segments count as `0`.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_segments = left.split(['.', '-', '+']);
    let mut right_segments = right.split(['.', '-', '+']);
    loop {
        let ordering = match (left_segments.next(), right_segments.next()) {
            (None, None) => return Ordering::Equal,
            (l, r) => compare_segment(l.unwrap_or("0"), r.unwrap_or("0")),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
}

fn compare_segment(left: &str, right: &str) -> Ordering {
    match (left.parse::<u64>(), right.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.cmp(right),
    }
}
