use crate::server_error::Headers;

use std::borrow::Cow;
use std::sync::Arc;

use async_nats::HeaderMap;

/// Applies a [`ServerError`](crate::ServerError)'s headers to an outgoing message.
///
/// Obtained from [`ServerError::respond_options`](crate::ServerError::respond_options).
/// Holds a read-only snapshot, so later header changes on the error are not
/// reflected.
#[derive(Clone, Debug, Default)]
pub struct RespondOptions {
    headers: Option<Arc<Headers>>,
}

impl RespondOptions {
    pub(crate) fn new(headers: Option<Arc<Headers>>) -> Self {
        Self {
            headers: headers.filter(|headers| !headers.is_empty()),
        }
    }

    /// Whether applying these options leaves the message untouched.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.headers.is_none()
    }

    /// Applies the headers to a message's header container.
    ///
    /// A missing container is created. Each header name replaces the values
    /// already present under that name; other names are left alone.
    pub fn apply(&self, target: &mut Option<HeaderMap>) {
        if self.is_noop() {
            return;
        }

        self.merge_into(target.get_or_insert_with(HeaderMap::new));
    }

    /// Merges the headers into an existing header map, overwriting by name.
    ///
    /// A name with an empty value list removes that name from `target`.
    pub fn merge_into(&self, target: &mut HeaderMap) {
        let Some(headers) = self.headers.as_deref() else {
            return;
        };

        let cleared: Vec<&str> = headers
            .iter()
            .filter(|(_, values)| values.is_empty())
            .map(|(name, _)| name.as_str())
            .collect();
        if !cleared.is_empty() {
            *target = without_names(target, &cleared);
        }

        for (name, values) in headers {
            let name = header_text(name);
            let mut values = values.iter();

            let Some(first) = values.next() else {
                continue;
            };

            target.insert(name.as_ref(), header_text(first).as_ref());
            for value in values {
                target.append(name.as_ref(), header_text(value).as_ref());
            }
        }
    }
}

// HeaderMap has no removal, so dropping names means rebuilding it.
fn without_names(source: &HeaderMap, names: &[&str]) -> HeaderMap {
    let mut rebuilt = HeaderMap::new();
    for (name, values) in source.iter() {
        let name = name.to_string();
        if names.contains(&name.as_str()) {
            continue;
        }
        for value in values {
            rebuilt.append(name.as_str(), value.to_string());
        }
    }
    rebuilt
}

/// Replaces CR and LF with spaces so a name or value cannot break the header block.
pub(crate) fn header_text(text: &str) -> Cow<'_, str> {
    if text.contains(['\r', '\n']) {
        Cow::Owned(text.replace(['\r', '\n'], " "))
    } else {
        Cow::Borrowed(text)
    }
}

#[cfg(test)]
mod tests {
    use super::header_text;
    use crate::server_error::{Headers, ServerError};

    use async_nats::HeaderMap;

    fn values(headers: &HeaderMap, name: &str) -> Vec<String> {
        headers
            .get_all(name)
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_no_headers_is_noop() {
        let options = ServerError::new("E", "d").respond_options();
        assert!(options.is_noop());

        let mut absent = None;
        options.apply(&mut absent);
        assert!(absent.is_none());

        let mut existing = HeaderMap::new();
        existing.insert("A", "y");
        let mut present = Some(existing.clone());
        options.apply(&mut present);
        assert_eq!(present, Some(existing));
    }

    #[test]
    fn test_error_headers_win_on_collision() {
        let options = ServerError::new("E", "d")
            .add_header_value("A", "x")
            .respond_options();

        let mut existing = HeaderMap::new();
        existing.insert("A", "y");
        existing.insert("B", "keep");
        let mut target = Some(existing);
        options.apply(&mut target);

        let headers = target.unwrap();
        assert_eq!(values(&headers, "A"), ["x"]);
        assert_eq!(values(&headers, "B"), ["keep"]);
    }

    #[test]
    fn test_missing_container_is_created() {
        let options = ServerError::new("E", "d")
            .add_header_value("A", "1")
            .add_header_value("A", "2")
            .respond_options();

        let mut target = None;
        options.apply(&mut target);

        let headers = target.unwrap();
        assert_eq!(values(&headers, "A"), ["1", "2"]);
    }

    #[test]
    fn test_snapshot_ignores_later_mutations() {
        let err = ServerError::new("E", "d").add_header_value("A", "before");
        let options = err.respond_options();
        let err = err.set_header_value("A", "after");

        let mut target = None;
        options.apply(&mut target);

        assert_eq!(values(&target.unwrap(), "A"), ["before"]);
        assert_eq!(err.header_values("A"), ["after"]);
    }

    #[test]
    fn test_empty_value_list_clears_existing_name() {
        let options = ServerError::new("E", "d")
            .with_headers(Headers::from([("A".to_string(), Vec::new())]))
            .respond_options();

        let mut existing = HeaderMap::new();
        existing.insert("A", "y");
        existing.insert("B", "keep");
        existing.append("B", "also");
        let mut target = Some(existing);
        options.apply(&mut target);

        let headers = target.unwrap();
        assert!(values(&headers, "A").is_empty());
        assert_eq!(values(&headers, "B"), ["keep", "also"]);
    }

    #[test]
    fn test_line_breaks_are_stripped_from_headers() {
        assert_eq!(header_text("plain"), "plain");
        assert_eq!(header_text("bad\r\nInjected: 1"), "bad  Injected: 1");

        let options = ServerError::new("E", "d")
            .add_header_value("X-Note", "one\ntwo")
            .respond_options();
        let mut target = None;
        options.apply(&mut target);

        assert_eq!(values(&target.unwrap(), "X-Note"), ["one two"]);
    }
}
