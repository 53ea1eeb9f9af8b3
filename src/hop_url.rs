//! URL building from `:name` path templates.
//!
//! Placeholders are consumed from a [`Params`] bag; whatever is left over is rendered
//! as the query string. A parameter bound to `None` is "undefined": it is skipped in the
//! query string and rejected when a placeholder needs it.

use crate::hop_error::{HopError, Result};

/// Insertion-ordered parameter bag for path placeholders and query values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, Option<String>)>,
}

impl Params {
    /// Create an empty bag.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add (or replace) a defined value.
    #[must_use]
    pub fn with(self, key: impl Into<String>, value: impl ToString) -> Self {
        self.with_opt(key, Some(value))
    }

    /// Add (or replace) a value that may be undefined.
    #[must_use]
    pub fn with_opt<V: ToString>(mut self, key: impl Into<String>, value: Option<V>) -> Self {
        self.insert(key, value.map(|v| v.to_string()));
        self
    }

    /// Insert a value in place, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    /// Remove a key, returning its value if the key was present.
    pub fn take(&mut self, key: &str) -> Option<Option<String>> {
        let pos = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(pos).1)
    }

    /// Whether the bag has no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the entries in insertion order.
    #[must_use = "iterators are lazy"]
    pub fn entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }
}

/// Substitute placeholders in `template` and append the remaining parameters as a query.
///
/// # Errors
///
/// Returns [`HopError::MissingParam`] if a placeholder has no parameter and
/// [`HopError::UndefinedParam`] if its parameter is `None`.
pub fn build_path(template: &str, mut params: Params) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(':') {
        let (head, tail) = rest.split_at(idx);
        out.push_str(head);

        let name_len = tail[1..]
            .find(['/', '?', '#'])
            .unwrap_or(tail.len() - 1);

        // A bare ':' is not a placeholder.
        if name_len == 0 {
            out.push(':');
            rest = &tail[1..];
            continue;
        }

        let name = &tail[1..=name_len];
        match params.take(name) {
            Some(Some(value)) => out.push_str(&value),
            Some(None) => return Err(HopError::UndefinedParam(name.to_string())),
            None => return Err(HopError::MissingParam(name.to_string())),
        }
        rest = &tail[name_len + 1..];
    }
    out.push_str(rest);

    if !params.is_empty() {
        out.push_str(&querystring(&params));
    }

    Ok(out)
}

/// Build a full URL: base (trailing `/` trimmed) + `/`-led path + query.
///
/// # Errors
///
/// See [`build_path`].
pub fn build_url(base: &str, template: &str, params: Params) -> Result<String> {
    let path = build_path(template, params)?;
    Ok(join(base, &path))
}

/// Render defined parameters as `?k=v&k2=v2`; empty when none are defined.
#[must_use]
pub fn querystring(params: &Params) -> String {
    let pairs: Vec<String> = params
        .entries()
        .filter_map(|(k, v)| v.map(|v| format!("{k}={v}")))
        .collect();

    if pairs.is_empty() {
        return String::new();
    }

    format!("?{}", pairs.join("&"))
}

fn join(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
