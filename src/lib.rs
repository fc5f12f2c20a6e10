//! # rb-counter
//!
//! An event counter backed by a red-black tree: ids map to counts, with point
//! updates, deletion, inclusive range sums and next/previous queries, all in
//! `O(log n)`.
//!
//! The tree ([`RbTree`]) is a general ordered map. Nodes live in a dense arena
//! and link to each other by index, so there is no shared sentinel node and no
//! `unsafe`. A tree can also be built in one linear pass from sorted input
//! ([`RbTree::from_sorted`]), which is how [`Counter`] loads its initial state.
//!
//! ## Example
//!
//! ```rust
//! use rb_counter::{Counter, RbTree};
//!
//! let mut tree = RbTree::new();
//! tree.insert(20, "b");
//! tree.insert(10, "a");
//! tree.insert(30, "c");
//! assert_eq!(tree.next(&10), Some((&20, &"b")));
//! assert_eq!(tree.previous(&10), None);
//!
//! let mut counter = Counter::from_sorted((1..=7).collect(), vec![10; 7]).unwrap();
//! assert_eq!(counter.increase(3, 5), 15);
//! assert_eq!(counter.reduce(3, 20), 0);
//! assert_eq!(counter.in_range(1, 7), 60);
//! ```

#![warn(clippy::all)]

mod bulk;
pub mod command;
pub mod counter;
pub mod error;
mod navigate;
mod node;
mod tree;

pub use command::{run, Command, Reply, Stats};
pub use counter::{Config, Counter};
pub use error::{Error, Result};
pub use navigate::{Iter, Range};
pub use node::NodeRef;
pub use tree::{NodeMut, RbTree};

#[cfg(test)]
mod proptests;
