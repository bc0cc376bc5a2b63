//! Bounded `LOOP(var, count) { body }` unrolling.

use super::literals::{inside_literal, literal_end};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Largest count a loop is unrolled for.
const MAX_LOOP_COUNT: i64 = 1_000;
/// Script size beyond which no further loop is unrolled.
const MAX_EXPANDED_LEN: usize = 4 * 1024 * 1024;

fn loop_header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\bLOOP\s*\(\s*([A-Za-z_]\w*)\s*,\s*(@?\w+)\s*\)\s*\{")
            .expect("Invalid regex pattern")
    })
}

fn declared_int_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"#DECLARE\s+(@\w+)\s+int\s*=\s*(-?\d+)\s*;").expect("Invalid regex pattern")
    })
}

/// Integer declarations visible to loop counts.
fn declared_ints(text: &str) -> HashMap<String, i64> {
    declared_int_regex()
        .captures_iter(text)
        .filter_map(|caps| Some((caps[1].to_string(), caps[2].parse().ok()?)))
        .collect()
}

/// Byte offset of the `}` closing the `{` at `open`, skipping braces in literals.
fn matching_brace(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'"' | b'\'' => {
                i = literal_end(text, i);
                continue;
            }
            b'{' => depth += 1,
            b'}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }

    None
}

fn resolve_count(count: &str, declared: &HashMap<String, i64>) -> Option<i64> {
    let n = if count.starts_with('@') {
        declared.get(count).copied()
    } else {
        count.parse().ok()
    };
    n.filter(|&n| n <= MAX_LOOP_COUNT)
}

fn unroll(body: &str, var: &str, count: i64) -> String {
    let body = body.trim();
    let marker = format!("@@{var}@@");
    let separator = if body.contains('\n') { "\n" } else { " " };

    (0..count.max(0))
        .map(|i| body.replace(&marker, &i.to_string()))
        .collect::<Vec<_>>()
        .join(separator)
}

/// Unrolls every `LOOP(var, count) { body }`.
///
/// `count` is an integer literal or an `@name` declared earlier as
/// `#DECLARE @name int = N;`. Each copy of the body has `@@var@@` replaced by
/// its 0-based iteration index. When the count cannot be resolved, or is too
/// large to unroll, the body is kept once, unexpanded. Braces inside string literals (format templates)
/// never close a loop, and loops nested in a body are expanded per copy.
pub fn expand_loops(text: &str) -> String {
    let declared = declared_ints(text);
    let mut out = text.to_string();
    let mut search_from = 0;

    while let Some(caps) = loop_header_regex().captures_at(&out, search_from) {
        let (Some(header), Some(var), Some(count)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            break;
        };
        let (start, header_end) = (header.start(), header.end());

        if inside_literal(&out, start) {
            search_from = header_end;
            continue;
        }

        let open = header_end - 1;
        let Some(close) = matching_brace(&out, open) else {
            search_from = header_end;
            continue;
        };

        let body = &out[open + 1..close];
        let fits = |n: i64| {
            let copies = usize::try_from(n).unwrap_or(0);
            out.len().saturating_add(body.len().saturating_mul(copies)) <= MAX_EXPANDED_LEN
        };
        let replacement = match resolve_count(count.as_str(), &declared).filter(|&n| fits(n)) {
            Some(n) => unroll(body, var.as_str(), n),
            None => body.trim().to_string(),
        };

        out.replace_range(start..=close, &replacement);
        search_from = start;
    }

    out
}
