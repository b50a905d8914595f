// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anchor-point detection: the handful of guest source shapes the
//! instrumenter recognizes as worth a trace line immediately after them.

/// A guest source shape worth tracing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorKind {
    /// An image-loading call (`Image.open`, `cv2.imread`, `load_image`).
    ImageLoad,
    /// A protocol parse call (`read_request`, `parse_request`).
    ProtocolParse,
    /// The start of a `try:` block.
    TryBlock,
    /// The start of an `except` clause.
    ExceptBlock,
}

impl AnchorKind {
    fn label(self) -> &'static str {
        match self {
            AnchorKind::ImageLoad => "image load",
            AnchorKind::ProtocolParse => "protocol parse",
            AnchorKind::TryBlock => "try block",
            AnchorKind::ExceptBlock => "except clause",
        }
    }
}

/// One recognized anchor: the zero-based line index of the anchoring line,
/// its indentation (in spaces, copied verbatim so the injected line matches
/// the guest's block), and what kind of anchor it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub line_index: usize,
    pub indent: String,
    pub kind: AnchorKind,
}

impl Anchor {
    /// The trace line to insert immediately after this anchor, indented to
    /// match the anchor's own line. Correct for `ImageLoad`/`ProtocolParse`
    /// anchors, which aren't block headers; a `TryBlock`/`ExceptBlock`
    /// anchor needs one level deeper than this and should go through
    /// `trace_statement_with_indent` instead, since the header's own indent
    /// would land the line outside the block it's meant to trace.
    pub fn trace_statement(&self, sentinel: &str) -> String {
        self.trace_statement_with_indent(sentinel, &self.indent)
    }

    /// Same trace line, indented with an explicitly supplied prefix rather
    /// than the anchor's own.
    pub fn trace_statement_with_indent(&self, sentinel: &str, indent: &str) -> String {
        format!(
            "{indent}print(\"{sentinel} after {} at source line {}\")",
            self.kind.label(),
            self.line_index + 1,
        )
    }
}

const IMAGE_LOAD_NEEDLES: &[&str] = &["Image.open(", "cv2.imread(", "load_image("];
const PROTOCOL_PARSE_NEEDLES: &[&str] = &["read_request(", "parse_request("];

/// Scan `source` for anchor points, in source order.
pub fn find_anchors(source: &str) -> Vec<Anchor> {
    let mut anchors = Vec::new();
    for (line_index, line) in source.lines().enumerate() {
        let trimmed = line.trim_start();
        let indent = &line[..line.len() - trimmed.len()];

        if trimmed.starts_with("try:") {
            anchors.push(Anchor { line_index, indent: indent.to_string(), kind: AnchorKind::TryBlock });
        } else if trimmed.starts_with("except") && trimmed.trim_end().ends_with(':') {
            anchors.push(Anchor { line_index, indent: indent.to_string(), kind: AnchorKind::ExceptBlock });
        } else if IMAGE_LOAD_NEEDLES.iter().any(|needle| trimmed.contains(needle)) {
            anchors.push(Anchor { line_index, indent: indent.to_string(), kind: AnchorKind::ImageLoad });
        } else if PROTOCOL_PARSE_NEEDLES.iter().any(|needle| trimmed.contains(needle)) {
            anchors.push(Anchor { line_index, indent: indent.to_string(), kind: AnchorKind::ProtocolParse });
        }
    }
    anchors
}
