//! Sparse override (`{bpatch}`) fragment generation
//!
//! A fragment re-declares a struct with the `{bpatch}` tag so the game merges
//! it onto the base declaration of the same name, and carries only the fields
//! and sections being changed.

use cfg_text::{Scope, find_block};
use regex::Regex;
use std::fmt;

const INDENT: &str = "   ";
const PATCH_TAG: &str = "{bpatch}";

/// One level of the nested section path opened inside a fragment
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Section {
    /// Opened as `<name> : struct.begin {bpatch}`
    Patch(String),
    /// Caller-formatted opening line, emitted as-is (must contain `struct.begin`)
    Opening(String),
}

impl Section {
    fn opening_line(&self) -> String {
        match self {
            Section::Patch(name) => format!("{name} : struct.begin {PATCH_TAG}"),
            Section::Opening(line) => line.trim().to_string(),
        }
    }
}

impl From<&str> for Section {
    /// A string already containing `struct.begin` is taken as a full opening
    /// line; anything else is a section name.
    fn from(value: &str) -> Self {
        if value.to_ascii_lowercase().contains("struct.begin") {
            Section::Opening(value.to_string())
        } else {
            Section::Patch(value.to_string())
        }
    }
}

impl From<String> for Section {
    fn from(value: String) -> Self {
        Section::from(value.as_str())
    }
}

/// Array-style entry appended at the innermost opened level
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    /// `[*] = value`
    Value(String),
    /// `[*] : struct.begin` holding the given fields, then `struct.end`
    Struct(Vec<(String, String)>),
}

/// Generated override block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFragment {
    struct_name: String,
    text: String,
}

impl PatchFragment {
    /// Start building a fragment for `struct_name`.
    pub fn builder(struct_name: impl Into<String>) -> FragmentBuilder {
        FragmentBuilder::new(struct_name)
    }

    pub fn struct_name(&self) -> &str {
        &self.struct_name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for PatchFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<PatchFragment> for String {
    fn from(fragment: PatchFragment) -> Self {
        fragment.text
    }
}

/// Builder for [`PatchFragment`].
///
/// Root properties go directly under the struct declaration. Nested
/// properties and entries go at the innermost opened section, or at the
/// root when no section path was given.
#[derive(Debug, Clone, Default)]
pub struct FragmentBuilder {
    struct_name: String,
    root_properties: Vec<(String, String)>,
    path: Vec<Section>,
    nested_properties: Vec<(String, String)>,
    entries: Vec<Entry>,
}

impl FragmentBuilder {
    pub fn new(struct_name: impl Into<String>) -> Self {
        Self {
            struct_name: struct_name.into(),
            ..Self::default()
        }
    }

    /// Add a `key = value` line directly under the struct declaration.
    pub fn property(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.root_properties.push((key.into(), value.to_string()));
        self
    }

    /// Add several root properties, keeping their order.
    pub fn properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        self.root_properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Open one more nested section.
    pub fn section(mut self, section: impl Into<Section>) -> Self {
        self.path.push(section.into());
        self
    }

    /// Open a whole path of nested sections, outermost first.
    pub fn path<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Section>,
    {
        self.path.extend(path.into_iter().map(Into::into));
        self
    }

    /// Add a `key = value` line at the innermost section.
    pub fn nested_property(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.nested_properties.push((key.into(), value.to_string()));
        self
    }

    /// Add several nested properties, keeping their order.
    pub fn nested_properties<I, K, V>(mut self, properties: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        self.nested_properties
            .extend(properties.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Append a `[*] = value` entry at the innermost section.
    pub fn value(mut self, value: impl fmt::Display) -> Self {
        self.entries.push(Entry::Value(value.to_string()));
        self
    }

    /// Append several `[*] = value` entries.
    pub fn values<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: fmt::Display,
    {
        self.entries
            .extend(values.into_iter().map(|v| Entry::Value(v.to_string())));
        self
    }

    /// Append a struct-valued `[*]` entry with the given fields.
    pub fn struct_entry<I, K, V>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: fmt::Display,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.to_string()))
            .collect();
        self.entries.push(Entry::Struct(fields));
        self
    }

    /// Render the fragment. Every opened level is closed in reverse order.
    pub fn build(&self) -> PatchFragment {
        let mut lines = vec![format!("{} : struct.begin {PATCH_TAG}", self.struct_name)];

        for (key, value) in &self.root_properties {
            lines.push(format!("{INDENT}{key} = {value}"));
        }

        let depth = self.path.len();
        for (level, section) in self.path.iter().enumerate() {
            lines.push(format!("{}{}", INDENT.repeat(level + 1), section.opening_line()));
        }

        let inner = INDENT.repeat(depth + 1);
        for (key, value) in &self.nested_properties {
            lines.push(format!("{inner}{key} = {value}"));
        }
        for entry in &self.entries {
            match entry {
                Entry::Value(value) => lines.push(format!("{inner}[*] = {value}")),
                Entry::Struct(fields) => {
                    lines.push(format!("{inner}[*] : struct.begin"));
                    for (key, value) in fields {
                        lines.push(format!("{inner}{INDENT}{key} = {value}"));
                    }
                    lines.push(format!("{inner}struct.end"));
                }
            }
        }

        for level in (1..=depth).rev() {
            lines.push(format!("{}struct.end", INDENT.repeat(level)));
        }
        lines.push("struct.end".to_string());

        let mut text = lines.join("\n");
        text.push('\n');

        PatchFragment {
            struct_name: self.struct_name.clone(),
            text,
        }
    }
}

/// Whether `patch_text` already holds a fragment for `struct_name` that
/// contains every value in `values` and every `key = value` in `properties`.
pub fn already_patched(
    patch_text: &str,
    struct_name: &str,
    values: &[&str],
    properties: &[(&str, &str)],
) -> bool {
    let Some(block) = find_block(patch_text, struct_name, Scope::TopLevel) else {
        return false;
    };

    if !values.iter().all(|value| block.contains(value)) {
        return false;
    }

    properties.iter().all(|(key, value)| {
        let pattern = format!(
            r"(?im)^[ \t]*{}[ \t]*=[ \t]*{}",
            regex::escape(key),
            regex::escape(value)
        );
        Regex::new(&pattern).is_ok_and(|re| re.is_match(block))
    })
}
