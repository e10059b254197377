use crate::prelude::{AnalysisError, AnalysisResult};
use roxmltree::Node;
use std::str::FromStr;

/// All descendants reached by following `path` (`a/b/c`), one element
/// level per segment, in document order.
pub fn find_all<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Vec<Node<'a, 'input>> {
    let mut current = vec![node];
    for segment in path.split('/').filter(|s| !s.is_empty() && *s != ".") {
        current = current
            .into_iter()
            .flat_map(|n| {
                n.children()
                    .filter(move |c| c.is_element() && c.has_tag_name(segment))
            })
            .collect();
    }
    current
}

/// First element reached by `path`, if any.
pub fn find<'a, 'input>(node: Node<'a, 'input>, path: &str) -> Option<Node<'a, 'input>> {
    find_all(node, path).into_iter().next()
}

/// Trimmed text of the element at `path`, or `MissingField`.
pub fn text_at(node: Node<'_, '_>, path: &str) -> AnalysisResult<String> {
    find(node, path)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| AnalysisError::MissingField(format!("<{}>/{}", node.tag_name().name(), path)))
}

pub fn value_at<T>(node: Node<'_, '_>, path: &str) -> AnalysisResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = text_at(node, path)?;
    raw.parse::<T>()
        .map_err(|err| AnalysisError::Parse(format!("{} = {:?}: {}", path, raw, err)))
}

/// Like [`value_at`], but a missing element is `None`. A present element
/// that does not parse is still an error.
pub fn optional_value_at<T>(node: Node<'_, '_>, path: &str) -> AnalysisResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match value_at(node, path) {
        Ok(value) => Ok(Some(value)),
        Err(AnalysisError::MissingField(_)) => Ok(None),
        Err(err) => Err(err),
    }
}

pub fn attribute<T>(node: Node<'_, '_>, name: &str) -> AnalysisResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = node.attribute(name).ok_or_else(|| {
        AnalysisError::MissingField(format!("<{}>@{}", node.tag_name().name(), name))
    })?;
    raw.trim()
        .parse::<T>()
        .map_err(|err| AnalysisError::Parse(format!("@{} = {:?}: {}", name, raw, err)))
}
