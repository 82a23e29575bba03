use std::convert::TryFrom;
use std::ops::Index;
use vec_map::VecMap;

/// A sparse map keyed by a dense integer-backed id. Cheaper than a `HashMap<K, V>`
/// when `K` is small and densely packed (type ids, predicate ids, ...).
#[derive(Debug, Clone)]
pub struct IdMap<K, V> {
    internal: VecMap<V>,
    phantom: std::marker::PhantomData<K>,
}

impl<K, V> Default for IdMap<K, V> {
    fn default() -> Self {
        IdMap {
            internal: Default::default(),
            phantom: std::marker::PhantomData,
        }
    }
}

impl<K: Into<usize>, V> IdMap<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains_key(&self, k: K) -> bool {
        self.internal.contains_key(k.into())
    }

    pub fn insert(&mut self, k: K, v: V) {
        self.internal.insert(k.into(), v);
    }

    pub fn get(&self, k: K) -> Option<&V> {
        self.internal.get(k.into())
    }

    pub fn get_mut(&mut self, k: K) -> Option<&mut V> {
        self.internal.get_mut(k.into())
    }

    pub fn keys_vec(&self) -> Vec<K>
    where
        K: TryFrom<usize>,
    {
        self.internal
            .keys()
            .map(|ki| K::try_from(ki).ok().expect("key out of range"))
            .collect()
    }
}

impl<K: Into<usize> + Copy, V> Index<K> for IdMap<K, V> {
    type Output = V;

    fn index(&self, index: K) -> &Self::Output {
        self.internal.get(index.into()).expect("No entry for key")
    }
}
