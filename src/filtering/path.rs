//! Relation path nesting.
//!
//! A dotted relation path such as `author.profile` plus a leaf field becomes
//! a right-nested chain of single-key maps, `{author: {profile: {field: leaf}}}`,
//! the shape relational query layers use to filter or order through relations.

use indexmap::IndexMap;

/// A node type that can wrap a map of children as a relation traversal.
pub trait Nestable: Sized {
    fn relation(children: IndexMap<String, Self>) -> Self;
}

fn single<N>(key: &str, node: N) -> IndexMap<String, N> {
    let mut map = IndexMap::with_capacity(1);
    map.insert(key.to_string(), node);
    map
}

/// Nest `leaf` under `field` inside every segment of `model`.
///
/// Empty segments (`"author..profile"`) are skipped.
pub fn build_path<N: Nestable>(model: &str, field: &str, leaf: N) -> IndexMap<String, N> {
    model
        .split('.')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .rev()
        .fold(single(field, leaf), |inner, segment| {
            single(segment, N::relation(inner))
        })
}

/// `{field: leaf}` when `model` is absent or blank, otherwise [`build_path`].
pub fn scope<N: Nestable>(model: Option<&str>, field: &str, leaf: N) -> IndexMap<String, N> {
    match model.filter(|path| !path.trim().is_empty()) {
        Some(path) => build_path(path, field, leaf),
        None => single(field, leaf),
    }
}
