//! Splits long partition-predicate lists into expressions that fit an
//! external catalog API's expression-length limit.
//!
//! Chunks are disjoint, so a failed chunk is a point to resume from: the
//! chunks before it stay applied.

use dbt_error::{AdapterError, AdapterErrorKind, AdapterResult};
use tracing::debug;

/// Expression limit of the Glue partition APIs.
pub const GLUE_MAX_EXPRESSION_LEN: usize = 2048;

pub const PREDICATE_SEPARATOR: &str = " OR ";

/// One API call's worth of predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateChunk {
    pub predicates: Vec<String>,
    /// The predicates joined with [PREDICATE_SEPARATOR]
    pub expression: String,
}

impl PredicateChunk {
    pub fn len(&self) -> usize {
        char_len(&self.expression)
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PredicateChunker {
    max_len: usize,
}

impl Default for PredicateChunker {
    fn default() -> Self {
        Self::new(GLUE_MAX_EXPRESSION_LEN)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

impl PredicateChunker {
    pub fn new(max_len: usize) -> Self {
        Self { max_len }
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Greedily pack predicates, in order, into chunks whose joined
    /// expression stays within the limit.
    ///
    /// A predicate longer than the limit on its own is a `Chunking` error and
    /// no chunks are produced.
    pub fn chunk<S: AsRef<str>>(&self, predicates: &[S]) -> AdapterResult<Vec<PredicateChunk>> {
        if let Some((idx, oversized)) = predicates
            .iter()
            .map(AsRef::as_ref)
            .enumerate()
            .find(|(_, p)| char_len(p) > self.max_len)
        {
            return Err(AdapterError::new(
                AdapterErrorKind::Chunking,
                format!(
                    "predicate {idx} is {} characters, longer than the {} character limit: {oversized}",
                    char_len(oversized),
                    self.max_len
                ),
            ));
        }

        let separator_len = char_len(PREDICATE_SEPARATOR);
        let mut chunks = Vec::new();
        let mut current: Vec<String> = Vec::new();
        let mut current_len = 0;

        for predicate in predicates.iter().map(AsRef::as_ref) {
            let predicate_len = char_len(predicate);
            let prospective = if current.is_empty() {
                predicate_len
            } else {
                current_len + separator_len + predicate_len
            };
            if prospective > self.max_len && !current.is_empty() {
                chunks.push(Self::close(std::mem::take(&mut current)));
                current_len = predicate_len;
            } else {
                current_len = prospective;
            }
            current.push(predicate.to_string());
        }
        if !current.is_empty() {
            chunks.push(Self::close(current));
        }

        debug!(
            predicates = predicates.len(),
            chunks = chunks.len(),
            max_len = self.max_len,
            "chunked predicates"
        );
        Ok(chunks)
    }

    fn close(predicates: Vec<String>) -> PredicateChunk {
        let expression = predicates.join(PREDICATE_SEPARATOR);
        PredicateChunk {
            predicates,
            expression,
        }
    }
}

/// Chunks with the Glue expression limit.
pub fn chunk_predicates<S: AsRef<str>>(predicates: &[S]) -> AdapterResult<Vec<PredicateChunk>> {
    PredicateChunker::default().chunk(predicates)
}

/// The chunks of a run that stopped at a failing chunk.
#[derive(Debug)]
pub struct PartialChunkFailure {
    /// Number of chunks applied before the failure
    pub completed: usize,
    /// The failed chunk followed by the ones never attempted
    pub remaining: Vec<PredicateChunk>,
    pub error: AdapterError,
}

/// Apply `f` to each chunk in order, stopping at the first failure.
///
/// Returns the number of chunks applied. Applied chunks are not rolled back;
/// retry with `remaining` to resume.
pub fn apply_chunks<F>(chunks: Vec<PredicateChunk>, mut f: F) -> Result<usize, PartialChunkFailure>
where
    F: FnMut(&PredicateChunk) -> AdapterResult<()>,
{
    for (idx, chunk) in chunks.iter().enumerate() {
        if let Err(error) = f(chunk) {
            return Err(PartialChunkFailure {
                completed: idx,
                remaining: chunks[idx..].to_vec(),
                error,
            });
        }
    }
    Ok(chunks.len())
}

/// `(col1='v1' AND col2='v2')` for one partition's values.
pub fn partition_predicate<C: AsRef<str>, V: AsRef<str>>(values: &[(C, V)]) -> String {
    let clauses = values
        .iter()
        .map(|(column, value)| {
            format!(
                "{}='{}'",
                column.as_ref(),
                value.as_ref().replace('\'', "''")
            )
        })
        .collect::<Vec<_>>();
    format!("({})", clauses.join(" AND "))
}
