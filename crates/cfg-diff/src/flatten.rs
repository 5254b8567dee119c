//! Struct flattening into `(path, raw value)` pairs

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;
use tracing::trace;

static OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([\w\[\]*]+)[ \t]*:[ \t]*struct\.begin\b").expect("open pattern is valid")
});

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([\w\[\]*]+)[ \t]*=[ \t]*(.*?)[ \t]*$").expect("field pattern is valid")
});

static END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^struct\.end\b").expect("end pattern is valid"));

/// One scalar field of a flattened struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlatField {
    /// Segments joined with `/`, e.g. `BehaviorTypes/Newbie/Short/MaxShots`
    pub path: String,
    /// Value exactly as written
    pub raw: String,
}

struct Level {
    segment: Option<String>,
    next_index: usize,
}

impl Level {
    fn segment_for(&mut self, key: &str) -> String {
        if key == "[*]" {
            let segment = format!("[{}]", self.next_index);
            self.next_index += 1;
            segment
        } else {
            key.to_string()
        }
    }
}

/// Every scalar field in `block`, in source order.
///
/// `block` starts at a struct declaration. Nested structs add a path
/// segment; `[*]` entries get positional segments `[0]`, `[1]`, ...
/// Scanning stops when the outer struct closes.
pub fn flatten_struct(block: &str) -> Vec<FlatField> {
    let mut fields = Vec::new();
    let mut stack: Vec<Level> = Vec::new();

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("//") {
            continue;
        }

        if let Some(caps) = OPEN.captures(line) {
            let segment = stack.last_mut().map(|parent| parent.segment_for(&caps[1]));
            stack.push(Level {
                segment,
                next_index: 0,
            });
            continue;
        }

        if END.is_match(line) {
            stack.pop();
            if stack.is_empty() {
                break;
            }
            continue;
        }

        let Some(level) = stack.last_mut() else {
            continue;
        };
        if let Some(caps) = FIELD.captures(line) {
            let key = level.segment_for(&caps[1]);
            let mut path: Vec<&str> = stack.iter().filter_map(|l| l.segment.as_deref()).collect();
            path.push(&key);
            fields.push(FlatField {
                path: path.join("/"),
                raw: caps[2].to_string(),
            });
        } else {
            trace!("Skipping unrecognised line: {}", line);
        }
    }

    fields
}
