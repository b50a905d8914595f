// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Injection and removal of sentinel-prefixed trace lines.

use crate::anchor::{Anchor, AnchorKind, find_anchors};
use isolab_core::DIAGNOSTIC_SENTINEL;

/// A sentinel line currently present in a piece of source, with its
/// zero-based line index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectedLine {
    pub line_index: usize,
    pub text: String,
}

fn ends_with_newline(source: &str) -> bool {
    source.ends_with('\n')
}

fn join_lines(lines: &[String], trailing_newline: bool) -> String {
    let mut joined = lines.join("\n");
    if trailing_newline {
        joined.push('\n');
    }
    joined
}

/// Remove every sentinel-prefixed line. Idempotent on already-clean source.
pub fn strip(source: &str) -> String {
    let trailing_newline = ends_with_newline(source);
    let lines: Vec<String> = source
        .lines()
        .filter(|line| !line.contains(DIAGNOSTIC_SENTINEL))
        .map(str::to_string)
        .collect();
    join_lines(&lines, trailing_newline)
}

/// True if `source` contains at least one sentinel-prefixed line.
pub fn is_injected(source: &str) -> bool {
    source.lines().any(|line| line.contains(DIAGNOSTIC_SENTINEL))
}

/// Insert a trace line after every recognized anchor point. Always
/// re-derives from the clean (stripped) source first, so injecting an
/// already-injected string is a no-op: `inject(inject(s)) == inject(s)`.
pub fn inject(source: &str) -> String {
    let clean = strip(source);
    let trailing_newline = ends_with_newline(&clean);
    let anchors = find_anchors(&clean);

    let mut out = Vec::new();
    for (line_index, line) in clean.lines().enumerate() {
        out.push(line.to_string());
        if let Some(anchor) = anchors.iter().find(|a| a.line_index == line_index) {
            let indent = body_indent(&clean, anchor);
            out.push(anchor.trace_statement_with_indent(DIAGNOSTIC_SENTINEL, &indent));
        }
    }
    join_lines(&out, trailing_newline)
}

/// The indentation the injected trace line should use. `TryBlock` and
/// `ExceptBlock` anchors are block headers, so the line has to sit one
/// level deeper than the header itself or it falls outside the block
/// (`IndentationError`); this reads the real indent off the block's first
/// body line rather than guessing a width, since the guest source may use
/// tabs or a non-4-space indent. `ImageLoad`/`ProtocolParse` anchors aren't
/// block headers, so they keep their own line's indent.
fn body_indent(source: &str, anchor: &Anchor) -> String {
    match anchor.kind {
        AnchorKind::TryBlock | AnchorKind::ExceptBlock => source
            .lines()
            .nth(anchor.line_index + 1)
            .map(|next| {
                let trimmed = next.trim_start();
                next[..next.len() - trimmed.len()].to_string()
            })
            .filter(|body_indent| body_indent.len() > anchor.indent.len())
            .unwrap_or_else(|| format!("{}    ", anchor.indent)),
        AnchorKind::ImageLoad | AnchorKind::ProtocolParse => anchor.indent.clone(),
    }
}

/// List the sentinel lines currently present, for surfacing in
/// "diagnostic mode activated" observability events.
pub fn injected_lines(source: &str) -> Vec<InjectedLine> {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| line.contains(DIAGNOSTIC_SENTINEL))
        .map(|(line_index, line)| InjectedLine { line_index, text: line.to_string() })
        .collect()
}
