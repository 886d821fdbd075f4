//! Tagger output synchronization
//!
//! A tagger emits one line per content token: the token in the first column,
//! features in between, the predicted label in the last column. Separator
//! tokens never appear. [`synchronize`] walks the source tokenization in
//! step with those lines and yields one [`LabeledTokens`] container per line,
//! ready for the [`ClusterBuilder`](crate::cluster::ClusterBuilder).

use crate::cluster::LabeledTokens;
use crate::error::{Result, SpantagError};
use crate::label::Label;
use crate::token::{normalize_and_remove_spaces, Token};

/// Split a tagger result into its sequences (blocks separated by blank lines)
///
/// Line endings may be `\n` or `\r\n`; a line of only whitespace counts as blank.
#[must_use]
pub fn sequences(result: &str) -> Vec<Vec<&str>> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();
    for line in result.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Rebuild a tokenization from result lines, one space between tokens
#[must_use]
pub fn tokens_from_result(lines: &[&str]) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(lines.len() * 2);
    let mut offset = 0;
    for line in lines {
        let Some(text) = line.split_whitespace().next() else {
            continue;
        };
        if !tokens.is_empty() {
            tokens.push(Token::new(" ", offset));
            offset += 1;
        }
        tokens.push(Token::new(text, offset));
        offset += text.chars().count();
    }
    tokens
}

/// Pair every result line with the tokens it covers
///
/// # Errors
///
/// Returns [`SpantagError::Synchronization`] when a result line has no label
/// column or its token cannot be found in the rest of the tokenization.
pub fn synchronize<'a>(result: &[&str], tokens: &'a [Token]) -> Result<Vec<LabeledTokens<'a>>> {
    let mut spans: Vec<(Label, usize, usize)> = Vec::with_capacity(result.len());
    let mut position = 0;

    for (line_no, line) in result.iter().enumerate() {
        let mut columns = line.split_whitespace();
        let Some(text) = columns.next() else {
            continue;
        };
        let label = columns.last().ok_or_else(|| {
            SpantagError::Synchronization(format!(
                "result line {} has no label column: {line:?}",
                line_no + 1
            ))
        })?;

        let expected = normalize_and_remove_spaces(text);
        let start = position;
        let found = tokens[start..]
            .iter()
            .position(|t| t.is_labelable() && t.normalized() == expected)
            .map(|i| start + i);

        match found {
            Some(i) => {
                spans.push((Label::parse(label), start, i + 1));
                position = i + 1;
            }
            None => {
                return Err(SpantagError::Synchronization(format!(
                    "token {text:?} of result line {} not found after token {start}",
                    line_no + 1
                )));
            }
        }
    }

    if let Some(last) = spans.last_mut() {
        last.2 = tokens.len();
    }

    Ok(spans
        .into_iter()
        .map(|(label, start, end)| LabeledTokens::new(label, &tokens[start..end]))
        .collect())
}
