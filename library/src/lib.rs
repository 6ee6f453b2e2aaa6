//! Monoid segment trees that are immutable values from the outside and are
//! updated in place only inside a branded [`enter_scope`] block.

pub mod error;
pub mod monoid;
pub mod multiset;
pub mod scope;

pub mod tree {
    pub mod segtree;
}

pub use error::{Error, Result};
pub use monoid::Monoid;
pub use multiset::{CountingMultiset, MultisetRef};
pub use scope::{enter_scope, MutableRef, Region, Scope};
pub use tree::segtree::SegTree;
