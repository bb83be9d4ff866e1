//! Group the consecutive items of a sorted sequence that share a key.

use std::iter::Fuse;

/// Iterator over `(key, items)` runs of consecutive items with equal keys.
/// Created by [`GroupByContiguousExt::group_by_contiguous`].
///
/// Equal keys that are not adjacent start a new group. Single pass: the
/// items of each group are moved out of the underlying iterator.
pub struct GroupByContiguous<I: Iterator, F> {
    iter: Fuse<I>,
    key_fn: F,
    // First item of the next group, read while closing the previous one.
    pending: Option<I::Item>,
}

impl<I, K, F> Iterator for GroupByContiguous<I, F>
where
    I: Iterator,
    F: FnMut(&I::Item) -> K,
    K: PartialEq,
{
    type Item = (K, Vec<I::Item>);

    fn next(&mut self) -> Option<Self::Item> {
        let first = self.pending.take().or_else(|| self.iter.next())?;
        let key = (self.key_fn)(&first);
        let mut group = vec![first];
        for item in self.iter.by_ref() {
            if (self.key_fn)(&item) == key {
                group.push(item);
            } else {
                self.pending = Some(item);
                break;
            }
        }
        Some((key, group))
    }
}

pub trait GroupByContiguousExt: Iterator + Sized {
    /// Group consecutive items by the key returned by `key_fn`.
    fn group_by_contiguous<K, F>(self, key_fn: F) -> GroupByContiguous<Self, F>
    where
        F: FnMut(&Self::Item) -> K,
        K: PartialEq,
    {
        GroupByContiguous {
            iter: self.fuse(),
            key_fn,
            pending: None,
        }
    }
}

impl<I: Iterator> GroupByContiguousExt for I {}
