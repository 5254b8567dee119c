//! Struct-block location by balanced begin/end marker counting

use regex::Regex;
use std::ops::Range;
use std::sync::LazyLock;
use tracing::trace;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bstruct\.(?:begin|end)\b").expect("marker pattern is valid")
});

static TOP_LEVEL_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^(\w+)[ \t]*:[ \t]*struct\.begin\b").expect("declaration pattern is valid")
});

static ANY_DEPTH_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^[ \t]*(\w+)[ \t]*:[ \t]*struct\.begin\b")
        .expect("declaration pattern is valid")
});

/// Where a declaration may sit on its line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    /// The name must start the line (top-level structs only)
    #[default]
    TopLevel,
    /// Leading whitespace is allowed (structs at any nesting depth)
    AnyDepth,
}

impl Scope {
    fn line_prefix(self) -> &'static str {
        match self {
            Scope::TopLevel => "",
            Scope::AnyDepth => r"[ \t]*",
        }
    }

    pub(crate) fn declaration_pattern(self) -> &'static Regex {
        match self {
            Scope::TopLevel => &TOP_LEVEL_DECLARATION,
            Scope::AnyDepth => &ANY_DEPTH_DECLARATION,
        }
    }
}

/// Anything that can hand out the text of a named struct.
///
/// Chain lookups walk parent references by name; the source decides which
/// text (one document, or a set of documents indexed by struct name) the
/// name is resolved against.
pub trait BlockSource {
    /// Text of the named struct, or `None` when this source does not define it.
    fn block(&self, name: &str) -> Option<&str>;
}

impl BlockSource for str {
    fn block(&self, name: &str) -> Option<&str> {
        find_block(self, name, Scope::TopLevel)
    }
}

impl BlockSource for String {
    fn block(&self, name: &str) -> Option<&str> {
        find_block(self, name, Scope::TopLevel)
    }
}

fn declaration_regex(name: &str, scope: Scope) -> Option<Regex> {
    let pattern = format!(
        r"(?im)^{}{}[ \t]*:[ \t]*struct\.begin\b",
        scope.line_prefix(),
        regex::escape(name)
    );
    match Regex::new(&pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            trace!(name, error = %e, "declaration pattern rejected");
            None
        }
    }
}

fn is_begin(marker: &str) -> bool {
    marker.len() == "struct.begin".len()
}

/// Byte range of the first `name : struct.begin` block in `text`, from the
/// start of the name to the end of its matching `struct.end`.
///
/// Returns `None` when no declaration matches or when the markers after the
/// declaration never balance.
pub fn find_block_span(text: &str, name: &str, scope: Scope) -> Option<Range<usize>> {
    let declaration = declaration_regex(name, scope)?.find(text)?;
    let matched = declaration.as_str();
    let start = declaration.start() + (matched.len() - matched.trim_start().len());

    let mut level = 0usize;
    for marker in MARKER.find_iter(&text[start..]) {
        if is_begin(marker.as_str()) {
            level += 1;
        } else {
            level = level.saturating_sub(1);
            if level == 0 {
                return Some(start..start + marker.end());
            }
        }
    }

    trace!(name, "unbalanced markers after declaration");
    None
}

/// Text of the first block named `name`, see [`find_block_span`].
pub fn find_block<'a>(text: &'a str, name: &str, scope: Scope) -> Option<&'a str> {
    find_block_span(text, name, scope).map(|span| &text[span])
}

/// Resolve a path of nested section names inside `text`.
///
/// Each element is located at any depth inside the span found for the
/// previous one. An empty path resolves to `text` itself.
pub fn find_section<'a, S: AsRef<str>>(text: &'a str, path: &[S]) -> Option<&'a str> {
    path.iter()
        .try_fold(text, |current, node| find_block(current, node.as_ref(), Scope::AnyDepth))
}

/// Whether the full section path resolves inside `text`.
pub fn has_section<S: AsRef<str>>(text: &str, path: &[S]) -> bool {
    find_section(text, path).is_some()
}

/// Whether `text` holds a `name = ...` line at any depth.
pub fn has_property(text: &str, name: &str) -> bool {
    let pattern = format!(r"(?im)^[ \t]*{}[ \t]*=", regex::escape(name));
    Regex::new(&pattern).is_ok_and(|re| re.is_match(text))
}

/// Names of every declaration in `text`, in document order.
pub fn declared_names(text: &str, scope: Scope) -> Vec<&str> {
    scope
        .declaration_pattern()
        .captures_iter(text)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
NPCBase : struct.begin {refkey=Base}
   Health = 100
   CombatParameters : struct.begin
      CheckEnemyTime = 20.0f
      Ranges : struct.begin
         Short = 10
      struct.end
   struct.end
struct.end
NPCBaseExtra : struct.begin
   Health = 5
struct.end
";

    fn count_markers(text: &str) -> (usize, usize) {
        MARKER.find_iter(text).fold((0, 0), |(b, e), m| {
            if is_begin(m.as_str()) { (b + 1, e) } else { (b, e + 1) }
        })
    }

    #[test]
    fn test_find_top_level_block() {
        let block = find_block(SAMPLE, "NPCBase", Scope::TopLevel).unwrap();
        assert!(block.starts_with("NPCBase : struct.begin"));
        assert!(block.ends_with("struct.end"));
        assert!(block.contains("Short = 10"));
        assert!(!block.contains("NPCBaseExtra"));
    }

    #[test]
    fn test_nested_blocks_do_not_end_parent_scan() {
        let block = find_block(SAMPLE, "NPCBase", Scope::TopLevel).unwrap();
        let (begins, ends) = count_markers(block);
        assert_eq!(begins, 3);
        assert_eq!(ends, 3);
    }

    #[test]
    fn test_name_prefix_is_not_a_match() {
        let block = find_block(SAMPLE, "NPCBaseExtra", Scope::TopLevel).unwrap();
        assert!(block.contains("Health = 5"));
        assert!(find_block(SAMPLE, "NPC", Scope::TopLevel).is_none());
    }

    #[test]
    fn test_top_level_scope_ignores_indented_declarations() {
        assert!(find_block(SAMPLE, "CombatParameters", Scope::TopLevel).is_none());
        let nested = find_block(SAMPLE, "CombatParameters", Scope::AnyDepth).unwrap();
        assert!(nested.starts_with("CombatParameters"));
        assert!(nested.contains("CheckEnemyTime"));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let text = "alpha : STRUCT.BEGIN\n   X = 1\nStruct.End\n";
        let block = find_block(text, "Alpha", Scope::TopLevel).unwrap();
        assert_eq!(block, text.trim_end());
    }

    #[test]
    fn test_unbalanced_block_is_absent() {
        let text = "Broken : struct.begin\n   Inner : struct.begin\n   X = 1\nstruct.end\n";
        assert!(find_block(text, "Broken", Scope::TopLevel).is_none());
        assert!(find_block(text, "Inner", Scope::AnyDepth).is_some());
    }

    #[test]
    fn test_span_rescans_as_single_balanced_struct() {
        for name in ["NPCBase", "CombatParameters", "Ranges", "NPCBaseExtra"] {
            let block = find_block(SAMPLE, name, Scope::AnyDepth).unwrap();
            let top = declared_names(block, Scope::TopLevel);
            assert_eq!(top, vec![name]);
            let (begins, ends) = count_markers(block);
            assert_eq!(begins, ends, "unbalanced span for {name}");
        }
    }

    #[test]
    fn test_find_section_path() {
        let root = find_block(SAMPLE, "NPCBase", Scope::TopLevel).unwrap();
        let ranges = find_section(root, &["CombatParameters", "Ranges"]).unwrap();
        assert!(ranges.contains("Short = 10"));
        assert!(has_section(root, &["CombatParameters", "Ranges"]));
        assert!(!has_section(root, &["CombatParameters", "Missing"]));
        assert_eq!(find_section::<&str>(root, &[]), Some(root));
    }

    #[test]
    fn test_has_property() {
        let root = find_block(SAMPLE, "NPCBase", Scope::TopLevel).unwrap();
        assert!(has_property(root, "health"));
        assert!(has_property(root, "CheckEnemyTime"));
        assert!(!has_property(root, "EnemyTime"));
    }

    #[test]
    fn test_declared_names_by_scope() {
        assert_eq!(
            declared_names(SAMPLE, Scope::TopLevel),
            vec!["NPCBase", "NPCBaseExtra"]
        );
        assert_eq!(
            declared_names(SAMPLE, Scope::AnyDepth),
            vec!["NPCBase", "CombatParameters", "Ranges", "NPCBaseExtra"]
        );
    }

    #[test]
    fn test_str_block_source() {
        let source: &str = SAMPLE;
        assert!(source.block("NPCBaseExtra").is_some());
        assert!(source.block("Ranges").is_none());
    }

    #[test]
    fn test_array_entry_names_are_escaped() {
        let text = "List : struct.begin\n   [*] : struct.begin\n      A = 1\n   struct.end\nstruct.end\n";
        let entry = find_block(text, "[*]", Scope::AnyDepth).unwrap();
        assert!(entry.contains("A = 1"));
    }
}
