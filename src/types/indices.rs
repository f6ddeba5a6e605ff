//! Strongly-typed index newtypes.
//!
//! Boundary compilation juggles two index spaces at once: open-boundary
//! segments and grid nodes. These newtypes keep them from being mixed up
//! in signatures and error messages.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Macro to generate index newtypes with common functionality.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $display_prefix:literal
    ) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        #[repr(transparent)]
        pub struct $name(usize);

        impl $name {
            /// Create a new index.
            #[inline]
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Get the raw index value.
            #[inline]
            pub const fn get(self) -> usize {
                self.0
            }

            /// First index (0).
            pub const ZERO: Self = Self(0);
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $display_prefix, self.0)
            }
        }

        impl From<usize> for $name {
            #[inline]
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            #[inline]
            fn from(idx: $name) -> usize {
                idx.0
            }
        }
    };
}

define_index!(
    /// Open-boundary segment index.
    ///
    /// Segments are numbered in the order the grid lists its open boundaries;
    /// compiled output is always emitted in ascending segment order.
    ///
    /// # Example
    ///
    /// ```
    /// use bctides::types::SegmentIndex;
    ///
    /// let seg = SegmentIndex::new(2);
    /// assert_eq!(seg.get(), 2);
    /// assert_eq!(seg.to_string(), "segment #2");
    /// ```
    SegmentIndex,
    "segment #"
);

define_index!(
    /// Grid node index (global numbering of the horizontal grid).
    NodeIndex,
    "node "
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_prefixes() {
        assert_eq!(SegmentIndex::new(0).to_string(), "segment #0");
        assert_eq!(NodeIndex::new(17).to_string(), "node 17");
    }

    #[test]
    fn test_conversions() {
        let idx: SegmentIndex = 5usize.into();
        let raw: usize = idx.into();
        assert_eq!(raw, 5);
        assert_eq!(SegmentIndex::ZERO.get(), 0);
    }

    #[test]
    fn test_ordering() {
        let mut segs = vec![SegmentIndex::new(3), SegmentIndex::new(1), SegmentIndex::new(2)];
        segs.sort();
        assert_eq!(
            segs,
            vec![SegmentIndex::new(1), SegmentIndex::new(2), SegmentIndex::new(3)]
        );
    }
}
