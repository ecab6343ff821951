//! Statement splitting on `;` outside quotes and comments

/// A single statement as it appears in the source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStatement<'a> {
    /// Statement text without the terminator, leading whitespace trimmed
    pub text: &'a str,
    /// Byte offset of `text` within the source file
    pub offset: usize,
}

/// Split SQL text into individual statements by semicolons,
/// respecting quoted strings and identifiers, dollar-quoted strings
/// and comments.
pub fn split_sql_statements(sql: &str) -> Vec<RawStatement<'_>> {
    let mut statements = Vec::new();
    let mut start = 0;
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'\'' | b'"' | b'`') => {
                i = match skip_quoted(bytes, i, quote) {
                    Some(end) => end,
                    None => next_terminator(bytes, i + 1),
                };
            }
            b'$' => {
                // Check for dollar-quoted string ($$...$$ or $tag$...$tag$)
                if let Some(tag_end) = find_dollar_tag_end(sql, i) {
                    let tag = &sql[i..=tag_end];
                    i = tag_end + 1;
                    match sql[i..].find(tag) {
                        Some(close_pos) => i += close_pos + tag.len(),
                        None => i = next_terminator(bytes, i),
                    }
                } else {
                    i += 1;
                }
            }
            b'-' if i + 1 < len && bytes[i + 1] == b'-' => {
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if i + 1 < len && bytes[i + 1] == b'*' => {
                i += 2;
                while i < len {
                    if i + 1 < len && bytes[i] == b'*' && bytes[i + 1] == b'/' {
                        i += 2;
                        break;
                    }
                    i += 1;
                }
            }
            b';' => {
                push_statement(&mut statements, sql, start, i);
                start = i + 1;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }

    // Last statement may lack a terminator
    push_statement(&mut statements, sql, start, len);

    statements
}

fn push_statement<'a>(statements: &mut Vec<RawStatement<'a>>, sql: &'a str, start: usize, end: usize) {
    let slice = &sql[start..end];
    let trimmed = slice.trim_start();
    if trimmed.trim_end().is_empty() {
        return;
    }
    statements.push(RawStatement {
        text: trimmed.trim_end(),
        offset: start + (slice.len() - trimmed.len()),
    });
}

/// Skip a quoted run starting at `start`, honoring doubled quotes.
/// Returns `None` if the quote never closes.
fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> Option<usize> {
    let len = bytes.len();
    let mut i = start + 1;
    while i < len {
        if bytes[i] == quote {
            i += 1;
            if i < len && bytes[i] == quote {
                i += 1;
            } else {
                return Some(i);
            }
        } else {
            i += 1;
        }
    }
    None
}

/// Position of the next `;` at or after `from`, or the end of input.
///
/// An unclosed quote ends its statement here so the statements after it
/// are still split out.
fn next_terminator(bytes: &[u8], from: usize) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&b| b == b';')
        .map_or(bytes.len(), |p| from + p)
}

/// Find the end of a dollar-quote tag starting at position `start`.
/// Returns the index of the closing `$` if a valid tag is found.
fn find_dollar_tag_end(sql: &str, start: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    let len = bytes.len();
    let mut i = start + 1;
    if i < len && bytes[i] == b'$' {
        return Some(i); // $$ tag
    }
    // Positional parameters like $1 are not tags
    if i < len && bytes[i].is_ascii_digit() {
        return None;
    }
    while i < len && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
        i += 1;
    }
    if i < len && i > start + 1 && bytes[i] == b'$' {
        Some(i)
    } else {
        None
    }
}
