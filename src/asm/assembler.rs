//! The assembler driver.
//!
//! Cleans the raw source, locates the `.text` and `.data` sections, and
//! walks the text section line by line through the instruction parser,
//! stopping at the first error.

use crate::plat::{Diagnostic, Program};

use super::{parser, AsmError};

/// Translates assembly source text into a validated instruction sequence.
///
/// The `.data` section, when present, is sliced out but not consumed: only
/// `.text` is honored. Assembly is fail-fast; the first ill-formed line
/// produces the run's single [`Diagnostic`] and no instructions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

impl Assembler {
    pub fn assemble(&self, source: &str) -> Program {
        let source = clean_source(source);

        let Some(text_start) = source.find(".text") else {
            return Err(Diagnostic::new(AsmError::MissingTextSection.to_string(), 0));
        };
        let (text_section, data_section) = match source.find(".data") {
            None => (&source[text_start + 5..], ""),
            Some(data_start) if data_start < text_start => (
                &source[text_start + 5..],
                &source[data_start + 5..text_start],
            ),
            Some(data_start) => (
                &source[text_start + 5..data_start],
                &source[data_start + 5..],
            ),
        };
        if !data_section.trim().is_empty() {
            log::debug!(
                ".data section present ({} lines) but not consumed; only .text is honored",
                data_section.trim().lines().count()
            );
        }

        let mut instructions = Vec::new();
        for (line_no, line) in text_section.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            match parser::parse_line(line) {
                Ok(ins) => {
                    log::trace!("line {line_no}: {ins}");
                    instructions.push(ins);
                }
                Err(e) => return Err(Diagnostic::new(e.to_string(), line_no)),
            }
        }
        Ok(instructions)
    }
}

/// Lowercases the source, strips comments (`;`, or `@` when no `;` is
/// present, to end of line), trims each line, and drops empty lines.
fn clean_source(source: &str) -> String {
    let lowered = source.to_lowercase();
    let lines: Vec<&str> = lowered
        .lines()
        .filter_map(|line| {
            let cut = line.find(';').or_else(|| line.find('@'));
            let line = match cut {
                Some(i) => &line[..i],
                None => line,
            }
            .trim();
            (!line.is_empty()).then_some(line)
        })
        .collect();
    lines.join("\n")
}
