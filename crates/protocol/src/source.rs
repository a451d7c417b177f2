//! Source type identification
//!
//! `SourceType` names the type an event was logged on behalf of. Together with
//! the method name it forms the grouping key used by batching sinks.

use std::fmt;
use std::sync::Arc;

/// Name of the type that produced a log event
///
/// # Example
///
/// ```
/// use logfan_protocol::SourceType;
///
/// struct OrderService;
///
/// let source = SourceType::of::<OrderService>();
/// assert_eq!(source.as_str(), "OrderService");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceType(Arc<str>);

impl SourceType {
    /// Create a source type from an explicit name
    #[inline]
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref()))
    }

    /// Derive the short type name of `T`
    ///
    /// Module paths are stripped, generic arguments are kept:
    /// `app::cache::Store<app::Key>` becomes `Store<Key>`.
    pub fn of<T: ?Sized>() -> Self {
        Self::new(short_type_name(std::any::type_name::<T>()))
    }

    /// Get the type name as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceType {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for SourceType {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Strip module paths from every path segment of a `type_name` string
pub(crate) fn short_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();

    for ch in full.chars() {
        match ch {
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' | '*' => {
                out.push_str(last_path_segment(&segment));
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(last_path_segment(&segment));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}
