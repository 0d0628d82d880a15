use std::{error, fmt};

/// Error enumerates over all possible errors that this package
/// shall return.
#[derive(Debug, PartialEq)]
pub enum Error<K> {
    /// Fatal case, a red node hangs off a red parent. Carries the key
    /// of the offending child.
    ConsecutiveReds(K),
    /// Fatal case, a red link leans right. Carries the key of the right
    /// child.
    RightLeaningRed(K),
    /// Fatal case, root to leaf paths don't agree on the number of black
    /// links. The String component of this variant can be used for
    /// debugging.
    UnbalancedBlacks(String),
    /// Fatal case, root is left red after a write operation.
    RedRoot,
    /// Fatal case, table entries are not in sort-order as per the
    /// comparator. Usually means the comparator is not a total order.
    SortError(K, K),
    /// Fatal case, cached subtree size is stale.
    SizeMismatch(K, String),
    /// Returned by create() API when key is already present.
    OverwriteKey,
}

impl<K> fmt::Display for Error<K>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::ConsecutiveReds(key) => write!(f, "consecutive reds at {:?}", key),
            Error::RightLeaningRed(key) => write!(f, "right leaning red at {:?}", key),
            Error::UnbalancedBlacks(msg) => write!(f, "unbalanced blacks, {}", msg),
            Error::RedRoot => write!(f, "root is red"),
            Error::SortError(child, parent) => {
                write!(f, "sort error, child {:?} parent {:?}", child, parent)
            }
            Error::SizeMismatch(key, msg) => write!(f, "size mismatch at {:?}, {}", key, msg),
            Error::OverwriteKey => write!(f, "key already present"),
        }
    }
}

impl<K> error::Error for Error<K> where K: fmt::Debug {}
