//! Event counter: a map from ids to counts on top of [`RbTree`].
//!
//! The initial state comes from a text file whose first line is a record count
//! followed by one `<id> <count>` pair per line, ascending by id.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::{debug, info};

use crate::error::{Error, Result};
use crate::tree::RbTree;

/// Loader configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Reject input whose ids are not strictly ascending instead of handing
    /// it to the unchecked bulk loader
    pub verify_order: bool,
    /// Reject input whose header count disagrees with the number of records
    pub strict_count: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            verify_order: true,
            strict_count: true,
        }
    }
}

/// Counts events per id.
///
/// [`reduce`](Counter::reduce) removes an id once its count drops to zero or
/// below. Other paths store counts as given: `increase` on an absent id keeps
/// `m` even if it is zero or negative, and so does the loader. Arithmetic
/// saturates at the `i64` bounds.
#[derive(Debug, Clone, Default)]
pub struct Counter {
    tree: RbTree<i64, i64>,
}

impl Counter {
    /// Creates an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a counter from parallel id/count arrays sorted ascending by id.
    pub fn from_sorted(ids: Vec<i64>, counts: Vec<i64>) -> Result<Self> {
        Ok(Self {
            tree: RbTree::from_sorted(ids, counts)?,
        })
    }

    /// Loads the initial state from `path` with the default [`Config`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with_config(path, &Config::default())
    }

    pub fn load_with_config(path: impl AsRef<Path>, config: &Config) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let counter = Self::from_reader(BufReader::new(file), config)?;
        info!("loaded {} ids from {}", counter.len(), path.display());
        Ok(counter)
    }

    /// Parses the initial-state format from any buffered reader.
    ///
    /// Blank lines are ignored. Each record must have exactly two integer
    /// fields.
    pub fn from_reader<R: BufRead>(reader: R, config: &Config) -> Result<Self> {
        let mut lines = reader
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line))
            .filter(|(_, line)| !matches!(line, Ok(l) if l.trim().is_empty()));

        let (header_line, header) = lines.next().ok_or(Error::MissingHeader)?;
        let header = header?;
        let expected: usize = header
            .trim()
            .parse()
            .map_err(|e| Error::parse(header_line, format!("bad record count '{}': {e}", header.trim())))?;

        let mut ids = Vec::with_capacity(expected);
        let mut counts = Vec::with_capacity(expected);
        for (line_no, line) in lines {
            let line = line?;
            let (id, count) = parse_record(line_no, &line)?;
            if config.verify_order {
                if let Some(&previous) = ids.last() {
                    if id <= previous {
                        return Err(Error::Unsorted {
                            line: line_no,
                            id,
                            previous,
                        });
                    }
                }
            }
            ids.push(id);
            counts.push(count);
        }

        if config.strict_count && ids.len() != expected {
            return Err(Error::RecordCount {
                expected,
                found: ids.len(),
            });
        }
        debug!("parsed {} records (header said {expected})", ids.len());
        Self::from_sorted(ids, counts)
    }

    /// Number of stored ids.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Adds `m` to the count of `id`, creating it at `m` if absent. Returns the
    /// new count.
    pub fn increase(&mut self, id: i64, m: i64) -> i64 {
        match self.tree.get_mut(&id) {
            Some(count) => {
                *count = count.saturating_add(m);
                *count
            }
            None => {
                self.tree.insert(id, m);
                m
            }
        }
    }

    /// Subtracts `m` from the count of `id`. An id whose count falls to zero
    /// or below is removed. Returns the remaining count, `0` if removed or
    /// absent.
    pub fn reduce(&mut self, id: i64, m: i64) -> i64 {
        let Some(count) = self.tree.get_mut(&id) else {
            return 0;
        };
        let remaining = count.saturating_sub(m);
        if remaining > 0 {
            *count = remaining;
            return remaining;
        }
        self.tree.delete(&id);
        debug!("id {id} dropped to {remaining}, removed");
        0
    }

    /// Current count of `id`, `0` if absent.
    pub fn count(&self, id: i64) -> i64 {
        self.tree.get(&id).copied().unwrap_or(0)
    }

    /// Total count over ids in `[low, high]`.
    pub fn in_range(&self, low: i64, high: i64) -> i64 {
        self.tree
            .range(&low, &high)
            .fold(0i64, |sum, (_, count)| sum.saturating_add(*count))
    }

    /// Smallest stored id greater than `id`, with its count.
    pub fn next(&self, id: i64) -> Option<(i64, i64)> {
        self.tree.next(&id).map(|(k, v)| (*k, *v))
    }

    /// Greatest stored id smaller than `id`, with its count.
    pub fn previous(&self, id: i64) -> Option<(i64, i64)> {
        self.tree.previous(&id).map(|(k, v)| (*k, *v))
    }

    /// Read access to the underlying tree.
    pub fn tree(&self) -> &RbTree<i64, i64> {
        &self.tree
    }
}

fn parse_record(line_no: usize, line: &str) -> Result<(i64, i64)> {
    let mut fields = line.split_whitespace();
    let (Some(id), Some(count), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(Error::parse(line_no, format!("expected '<id> <count>', got '{line}'")));
    };
    let field = |s: &str| {
        s.parse::<i64>()
            .map_err(|e| Error::parse(line_no, format!("bad number '{s}': {e}")))
    };
    Ok((field(id)?, field(count)?))
}
