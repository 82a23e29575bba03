//! Dense, integer-keyed stores used throughout the grounder and search core
//! to hash-cons values (facts, operators, states) into permanent small ids.

use itertools::Itertools;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt::{Debug, Error, Formatter};
use std::hash::Hash;
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

pub trait Ref: Into<usize> + From<usize> + Copy + PartialEq {}

impl<X> Ref for X where X: Into<usize> + From<usize> + Copy + PartialEq {}

/// Declares a newtype wrapping a `NonZeroU32`, usable as the key of a
/// [`RefStore`]/[`RefPool`]/[`RefVec`]. The `NonZeroU32` niche keeps
/// `Option<Key>` the same size as `Key`.
#[macro_export]
macro_rules! create_ref_type {
    ($type_name:ident) => {
        #[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Debug)]
        pub struct $type_name(std::num::NonZeroU32);

        impl $type_name {
            pub const fn to_u32(self) -> u32 {
                self.0.get() - 1
            }
            pub const fn from_u32(u: u32) -> Self {
                unsafe { $type_name(std::num::NonZeroU32::new_unchecked(u + 1)) }
            }
        }
        impl From<usize> for $type_name {
            fn from(u: usize) -> Self {
                Self::from_u32(u as u32)
            }
        }
        impl From<$type_name> for usize {
            fn from(v: $type_name) -> Self {
                (v.0.get() - 1) as usize
            }
        }
        impl From<u32> for $type_name {
            fn from(u: u32) -> Self {
                Self::from_u32(u)
            }
        }
        impl From<$type_name> for u32 {
            fn from(v: $type_name) -> Self {
                v.0.get() - 1
            }
        }
    };
}

/// A store that hash-cons-es values of type `V` into dense keys of type `K`:
/// inserting an already-seen value returns its existing id.
#[derive(Clone)]
pub struct RefPool<Key, Val> {
    internal: Vec<Val>,
    rev: HashMap<Val, Key>,
}

impl<K, V: Hash + Eq> Default for RefPool<K, V> {
    fn default() -> Self {
        RefPool {
            internal: Default::default(),
            rev: HashMap::new(),
        }
    }
}

impl<K, V: Debug> Debug for RefPool<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:?}", self.internal.iter().enumerate().format(", "))
    }
}

impl<K, V> RefPool<K, V>
where
    K: Ref,
{
    pub fn len(&self) -> usize {
        self.internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> {
        (0..self.len()).map(K::from)
    }

    /// Interns `v`, returning its existing id if already present, or a new one otherwise.
    /// Returns `(id, is_new)` so callers can distinguish first insertion.
    pub fn intern(&mut self, v: V) -> (K, bool)
    where
        V: Eq + Hash + Clone,
    {
        if let Some(&id) = self.rev.get(&v) {
            (id, false)
        } else {
            let id: K = self.internal.len().into();
            self.rev.insert(v.clone(), id);
            self.internal.push(v);
            (id, true)
        }
    }

    pub fn push(&mut self, v: V) -> K
    where
        V: Eq + Hash + Clone + Debug,
    {
        assert!(!self.rev.contains_key(&v), "Duplicated value: {:?}", &v);
        let id: K = self.internal.len().into();
        self.rev.insert(v.clone(), id);
        self.internal.push(v);
        id
    }

    pub fn get(&self, k: K) -> &V {
        &self.internal[k.into()]
    }

    pub fn get_ref<W: ?Sized>(&self, v: &W) -> Option<K>
    where
        W: Eq + Hash,
        V: Eq + Hash + Borrow<W>,
    {
        self.rev.get(v).copied()
    }
}

impl<K: Ref, V> Index<K> for RefPool<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.get(index)
    }
}

/// Same as [`RefPool`] but does not keep a reverse index: ids are only
/// handed out upon insertion and cannot be looked up from a value.
#[derive(Clone)]
pub struct RefStore<Key, Val> {
    internal: Vec<Val>,
    phantom: PhantomData<Key>,
}

impl<K, V: Debug> Debug for RefStore<K, V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{:?}", self.internal.iter().enumerate().format(", "))
    }
}

impl<K: Ref, V> Default for RefStore<K, V> {
    fn default() -> Self {
        RefStore::new()
    }
}

impl<K, V> RefStore<K, V>
where
    K: Ref,
{
    pub fn new() -> Self {
        RefStore {
            internal: Vec::new(),
            phantom: PhantomData,
        }
    }

    pub fn initialized(len: usize, v: V) -> Self
    where
        V: Clone,
    {
        RefStore {
            internal: vec![v; len],
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.internal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.internal.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = K> {
        (0..self.len()).map(K::from)
    }

    pub fn entries(&self) -> impl Iterator<Item = (K, &V)> {
        self.keys().map(move |k| (k, &self[k]))
    }

    pub fn last_key(&self) -> Option<K> {
        if self.is_empty() {
            None
        } else {
            Some((self.len() - 1).into())
        }
    }

    pub fn push(&mut self, v: V) -> K {
        let id: K = self.internal.len().into();
        self.internal.push(v);
        id
    }

    pub fn get(&self, k: K) -> &V {
        &self.internal[k.into()]
    }

    pub fn get_mut(&mut self, k: K) -> &mut V {
        &mut self.internal[k.into()]
    }
}

impl<K: Ref, V> Index<K> for RefStore<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.get(index)
    }
}

impl<K: Ref, V> IndexMut<K> for RefStore<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        self.get_mut(index)
    }
}

/// A growable, densely-indexed vector keyed by `K`, used for per-fact or
/// per-operator side tables (e.g. watchers, achievers) grown lazily as new
/// keys are observed.
#[derive(Clone)]
pub struct RefVec<K, V> {
    values: Vec<V>,
    phantom: PhantomData<K>,
}

impl<K, V> Default for RefVec<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> RefVec<K, V> {
    pub fn new() -> Self {
        RefVec {
            values: Vec::new(),
            phantom: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn last_key(&self) -> Option<K>
    where
        K: From<usize>,
    {
        if self.values.is_empty() {
            None
        } else {
            Some(K::from(self.values.len() - 1))
        }
    }

    pub fn push(&mut self, value: V) -> K
    where
        K: From<usize>,
    {
        self.values.push(value);
        K::from(self.values.len() - 1)
    }

    /// Grows the vec with `value_gen()` until `k` is a valid index, then returns
    /// a mutable reference to the slot at `k`. Used to lazily extend side tables
    /// (watchers, achievers) indexed by a fact/operator key that grows monotonically.
    pub fn get_or_grow_mut(&mut self, k: K, value_gen: impl Fn() -> V) -> &mut V
    where
        K: Ref,
    {
        let idx: usize = k.into();
        while self.values.len() <= idx {
            self.values.push(value_gen());
        }
        &mut self.values[idx]
    }

    pub fn keys(&self) -> impl Iterator<Item = K>
    where
        K: From<usize>,
    {
        (0..self.values.len()).map(K::from)
    }

    pub fn entries(&self) -> impl Iterator<Item = (K, &V)>
    where
        K: From<usize>,
    {
        (0..self.values.len()).map(move |i| (K::from(i), &self.values[i]))
    }
}

impl<K: Into<usize>, V> Index<K> for RefVec<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        &self.values[index.into()]
    }
}

impl<K: Into<usize>, V> IndexMut<K> for RefVec<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        &mut self.values[index.into()]
    }
}

/// A partial map keyed by a dense ref type, backed by a flat `Vec<Option<V>>`.
/// Unlike [`RefVec`] a key need not be declared before being queried with
/// [`RefMap::contains`], and entries can be removed again.
#[derive(Clone)]
pub struct RefMap<K, V> {
    values: Vec<Option<V>>,
    phantom: PhantomData<K>,
}

impl<K, V> Default for RefMap<K, V> {
    fn default() -> Self {
        RefMap {
            values: Vec::new(),
            phantom: PhantomData,
        }
    }
}

impl<K: Ref, V> RefMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn contains(&self, k: K) -> bool {
        let idx: usize = k.into();
        idx < self.values.len() && self.values[idx].is_some()
    }

    pub fn insert(&mut self, k: K, v: V) {
        let idx: usize = k.into();
        while self.values.len() <= idx {
            self.values.push(None);
        }
        self.values[idx] = Some(v);
    }

    pub fn remove(&mut self, k: K) -> Option<V> {
        let idx: usize = k.into();
        if idx < self.values.len() {
            self.values[idx].take()
        } else {
            None
        }
    }

    pub fn get(&self, k: K) -> Option<&V> {
        let idx: usize = k.into();
        self.values.get(idx).and_then(|o| o.as_ref())
    }

    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        let idx: usize = k.into();
        self.values.get_mut(idx).and_then(|o| o.as_mut())
    }

    pub fn keys(&self) -> impl Iterator<Item = K> + '_
    where
        K: From<usize>,
    {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|_| K::from(i)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.values.iter().filter_map(|v| v.as_ref())
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.values.iter_mut().filter_map(|v| v.as_mut())
    }

    pub fn entries(&self) -> impl Iterator<Item = (K, &V)> + '_
    where
        K: From<usize>,
    {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (K::from(i), v)))
    }
}

impl<K: Ref, V> FromIterator<(K, V)> for RefMap<K, V> {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = RefMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<K: Ref, V> Index<K> for RefMap<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.get(index).expect("No such key")
    }
}

impl<K: Ref, V> IndexMut<K> for RefMap<K, V> {
    fn index_mut(&mut self, index: K) -> &mut Self::Output {
        self.get_mut(index).expect("No such key")
    }
}
