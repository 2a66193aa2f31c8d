//! Route label helpers.

use uuid::Uuid;

/// Collapse id path segments so metrics labels stay low cardinality.
pub(super) fn route_label(path: &str) -> String {
    if path == "/" {
        return "/".to_owned();
    }

    let mut normalised = String::new();

    for segment in path.trim_start_matches('/').split('/') {
        normalised.push('/');

        if Uuid::parse_str(segment).is_ok() {
            normalised.push_str("{id}");
        } else {
            normalised.push_str(segment);
        }
    }

    normalised
}
