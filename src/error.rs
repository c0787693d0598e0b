/// The error returned by find-or-fail lookups such as [`AvlTree::at`](crate::AvlTree::at).
#[derive(Copy, Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("key not found")]
pub struct KeyError;
