//! Ordered symbol table on [left-leaning-red-black][llrb] tree.
//!
//! Apart from point lookups and writes, [`Llrb`] answers order queries,
//! min, max, floor, ceiling, rank, select and inclusive key ranges, in
//! logarithmic time. Keys are ordered by a [`Compare`] implementation,
//! natural order by default.
//!
//! ```
//! use llrb_table::Llrb;
//!
//! let mut llrb: Llrb<i64, i64> = Llrb::new("example");
//! for key in [5, 3, 8, 1, 4, 7, 9].iter() {
//!     llrb.put(*key, key * 10);
//! }
//! assert_eq!(llrb.select(3), Some(5));
//! assert_eq!(llrb.rank(&7), 4);
//! assert_eq!(llrb.keys(&3, &8), vec![3, 4, 5, 7, 8]);
//! assert!(llrb.validate().is_ok());
//! ```
//!
//! [llrb]: https://en.wikipedia.org/wiki/Left-leaning_red-black_tree

mod depth;
mod error;
mod llrb;
mod node;

pub use crate::depth::Depth;
pub use crate::error::Error;
pub use crate::llrb::{Iter, Llrb, Range, Reverse, Stats};
pub use compare::{natural, Compare, Natural};

#[cfg(test)]
mod llrb_test;
