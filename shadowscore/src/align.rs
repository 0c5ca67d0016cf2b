//! Word-level alignment of target tokens against hypothesis tokens.
//!
//! The diff recursively takes the longest contiguous matching block, then
//! aligns what lies to its left and right. Between matching blocks the
//! leftover runs are classified as replace, delete or insert and expanded into
//! per-word edits.

use crate::types::{DiffEdit, TimeSpan};
use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

/// Normalized hypothesis word with its recognizer timing.
#[derive(Clone, Debug, PartialEq)]
pub struct HypWord {
    pub word: String,
    pub span: Option<TimeSpan>,
}

impl HypWord {
    pub fn new(word: impl Into<String>, span: Option<TimeSpan>) -> Self {
        Self {
            word: word.into(),
            span,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Opcode {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// Contiguous run of the diff: `target[target]` relates to `hyp[hyp]` by `op`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Run {
    pub op: Opcode,
    pub target: Range<usize>,
    pub hyp: Range<usize>,
}

/// Matching block `(i, j, len)`: `a[i..i + len] == b[j..j + len]`.
type Block = (usize, usize, usize);

/// Longest matching block inside `a[alo..ahi]` and `b[blo..bhi]`.
///
/// Ties go to the block starting earliest in `a`, then earliest in `b`.
fn longest_match<T: Eq + Hash>(
    a: &[T],
    b_index: &HashMap<&T, Vec<usize>>,
    (alo, ahi): (usize, usize),
    (blo, bhi): (usize, usize),
) -> Block {
    let mut best = (alo, blo, 0);
    // j2len[j] = length of the match ending at a[i - 1], b[j]
    let mut j2len: HashMap<usize, usize> = HashMap::new();

    for (i, item) in a.iter().enumerate().take(ahi).skip(alo) {
        let mut next_j2len = HashMap::new();
        for &j in b_index.get(item).map(Vec::as_slice).unwrap_or_default() {
            if j < blo {
                continue;
            }
            if j >= bhi {
                break;
            }
            let k = j
                .checked_sub(1)
                .and_then(|prev| j2len.get(&prev))
                .copied()
                .unwrap_or(0)
                + 1;
            next_j2len.insert(j, k);
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        j2len = next_j2len;
    }

    best
}

/// All matching blocks in order, adjacent blocks merged, terminated by a
/// zero-length sentinel at `(a.len(), b.len())`.
fn matching_blocks<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Block> {
    let mut b_index: HashMap<&T, Vec<usize>> = HashMap::new();
    for (j, item) in b.iter().enumerate() {
        b_index.entry(item).or_default().push(j);
    }

    let mut pending = vec![(0, a.len(), 0, b.len())];
    let mut blocks = Vec::new();
    while let Some((alo, ahi, blo, bhi)) = pending.pop() {
        let (i, j, k) = longest_match(a, &b_index, (alo, ahi), (blo, bhi));
        if k == 0 {
            continue;
        }
        blocks.push((i, j, k));
        if alo < i && blo < j {
            pending.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            pending.push((i + k, ahi, j + k, bhi));
        }
    }
    blocks.sort_unstable();

    let mut merged: Vec<Block> = Vec::with_capacity(blocks.len() + 1);
    for (i, j, k) in blocks {
        if let Some(last) = merged.last_mut()
            && last.0 + last.2 == i
            && last.1 + last.2 == j
        {
            last.2 += k;
        } else {
            merged.push((i, j, k));
        }
    }
    merged.push((a.len(), b.len(), 0));
    merged
}

/// Classify the two sequences into contiguous runs covering both completely.
pub fn diff_runs<T: Eq + Hash>(a: &[T], b: &[T]) -> Vec<Run> {
    let mut runs = Vec::new();
    let (mut i, mut j) = (0, 0);

    for (ai, bj, size) in matching_blocks(a, b) {
        let op = match (i < ai, j < bj) {
            (true, true) => Some(Opcode::Replace),
            (true, false) => Some(Opcode::Delete),
            (false, true) => Some(Opcode::Insert),
            (false, false) => None,
        };
        if let Some(op) = op {
            runs.push(Run {
                op,
                target: i..ai,
                hyp: j..bj,
            });
        }
        i = ai + size;
        j = bj + size;
        if size > 0 {
            runs.push(Run {
                op: Opcode::Equal,
                target: ai..i,
                hyp: bj..j,
            });
        }
    }

    runs
}

/// Align target tokens against hypothesis words into an ordered edit list.
///
/// Matches, substitutions and insertions carry the hypothesis word's span;
/// missing edits are left untimed.
pub fn align(target: &[String], hyp: &[HypWord]) -> Vec<DiffEdit> {
    let hyp_tokens: Vec<&str> = hyp.iter().map(|w| w.word.as_str()).collect();
    let target_tokens: Vec<&str> = target.iter().map(String::as_str).collect();

    let mut edits = Vec::with_capacity(target.len().max(hyp.len()));
    for run in diff_runs(&target_tokens, &hyp_tokens) {
        let t = &target[run.target.clone()];
        let h = &hyp[run.hyp.clone()];
        match run.op {
            Opcode::Equal => {
                edits.extend(
                    t.iter()
                        .zip(h)
                        .map(|(t, h)| DiffEdit::matched(t, &h.word, h.span)),
                );
            }
            Opcode::Replace => {
                let paired = t.len().min(h.len());
                edits.extend(
                    t.iter()
                        .zip(h)
                        .map(|(t, h)| DiffEdit::substitution(t, &h.word, h.span)),
                );
                edits.extend(t[paired..].iter().map(DiffEdit::missing));
                edits.extend(
                    h[paired..]
                        .iter()
                        .map(|h| DiffEdit::insertion(&h.word, h.span)),
                );
            }
            Opcode::Delete => edits.extend(t.iter().map(DiffEdit::missing)),
            Opcode::Insert => {
                edits.extend(h.iter().map(|h| DiffEdit::insertion(&h.word, h.span)));
            }
        }
    }

    edits
}
