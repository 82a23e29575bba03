//! C1: the fact interner. Three parallel hash-cons tables (dynamic, static,
//! function atoms) sharing a key shape but non-overlapping id spaces (§9
//! "Ground-atom identity across tables").

use strips_collections::create_ref_type;
use strips_collections::ref_store::RefPool;
use strips_model::symbols::SymId;

create_ref_type!(DynAtomId);
create_ref_type!(StaticAtomId);
create_ref_type!(FuncAtomId);

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GroundAtomKey {
    pub predicate: SymId,
    pub args: ArgObjVec,
}

/// Ground-atom arguments are always object ids by the time they reach the
/// interner (lifted `Term::Param` slots have been substituted).
pub type ArgObjVec = smallvec::SmallVec<[SymId; 4]>;

impl GroundAtomKey {
    pub fn new(predicate: SymId, args: impl IntoIterator<Item = SymId>) -> Self {
        GroundAtomKey { predicate, args: args.into_iter().collect() }
    }
}

#[derive(Default)]
pub struct FactInterner {
    dynamic: RefPool<DynAtomId, GroundAtomKey>,
    static_db: RefPool<StaticAtomId, GroundAtomKey>,
    functions: RefPool<FuncAtomId, GroundAtomKey>,
    function_values: Vec<i64>,
}

impl FactInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern_dynamic(&mut self, predicate: SymId, args: &[SymId]) -> (DynAtomId, bool) {
        self.dynamic.intern(GroundAtomKey::new(predicate, args.iter().copied()))
    }

    pub fn lookup_dynamic(&self, predicate: SymId, args: &[SymId]) -> Option<DynAtomId> {
        self.dynamic.get_ref(&GroundAtomKey::new(predicate, args.iter().copied()))
    }

    pub fn intern_static(&mut self, predicate: SymId, args: &[SymId]) -> (StaticAtomId, bool) {
        self.static_db.intern(GroundAtomKey::new(predicate, args.iter().copied()))
    }

    pub fn lookup_static(&self, predicate: SymId, args: &[SymId]) -> Option<StaticAtomId> {
        self.static_db.get_ref(&GroundAtomKey::new(predicate, args.iter().copied()))
    }

    /// Interns a numeric function atom together with its scalar value, set at
    /// first insertion (§4.1: "Function atoms additionally store a scalar value").
    pub fn intern_function(&mut self, predicate: SymId, args: &[SymId], value: i64) -> (FuncAtomId, bool) {
        let (id, is_new) = self.functions.intern(GroundAtomKey::new(predicate, args.iter().copied()));
        if is_new {
            debug_assert_eq!(usize::from(id), self.function_values.len());
            self.function_values.push(value);
        }
        (id, is_new)
    }

    pub fn lookup_function(&self, predicate: SymId, args: &[SymId]) -> Option<FuncAtomId> {
        self.functions.get_ref(&GroundAtomKey::new(predicate, args.iter().copied()))
    }

    pub fn function_value(&self, id: FuncAtomId) -> i64 {
        self.function_values[usize::from(id)]
    }

    pub fn dynamic_key(&self, id: DynAtomId) -> &GroundAtomKey {
        self.dynamic.get(id)
    }

    pub fn static_key(&self, id: StaticAtomId) -> &GroundAtomKey {
        self.static_db.get(id)
    }

    pub fn dynamic_atoms(&self) -> impl Iterator<Item = (DynAtomId, &GroundAtomKey)> {
        self.dynamic.keys().map(move |k| (k, self.dynamic.get(k)))
    }

    pub fn static_atoms(&self) -> impl Iterator<Item = (StaticAtomId, &GroundAtomKey)> {
        self.static_db.keys().map(move |k| (k, self.static_db.get(k)))
    }

    pub fn num_dynamic(&self) -> usize {
        self.dynamic.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interning_is_idempotent() {
        let mut interner = FactInterner::new();
        let at = SymId::from(0usize);
        let r1 = SymId::from(1usize);
        let l1 = SymId::from(2usize);

        let (id1, fresh1) = interner.intern_dynamic(at, &[r1, l1]);
        assert!(fresh1);
        let (id2, fresh2) = interner.intern_dynamic(at, &[r1, l1]);
        assert!(!fresh2);
        assert_eq!(id1, id2);
        assert_eq!(interner.num_dynamic(), 1);
        assert_eq!(interner.lookup_dynamic(at, &[r1, l1]), Some(id1));
        assert_eq!(interner.lookup_dynamic(at, &[l1, r1]), None);
    }

    #[test]
    fn dynamic_and_static_ids_are_independent_spaces() {
        let mut interner = FactInterner::new();
        let p = SymId::from(0usize);
        let a = SymId::from(1usize);
        let (dyn_id, _) = interner.intern_dynamic(p, &[a]);
        let (static_id, _) = interner.intern_static(p, &[a]);
        assert_eq!(usize::from(dyn_id), usize::from(static_id));
        assert_eq!(interner.dynamic_key(dyn_id), interner.static_key(static_id));
    }

    #[test]
    fn function_atoms_store_their_value_at_first_insertion() {
        let mut interner = FactInterner::new();
        let cost = SymId::from(0usize);
        let a = SymId::from(1usize);
        let (id, fresh) = interner.intern_function(cost, &[a], 42);
        assert!(fresh);
        assert_eq!(interner.function_value(id), 42);
        // Re-interning the same atom with a different value does not update it.
        let (id2, fresh2) = interner.intern_function(cost, &[a], 7);
        assert!(!fresh2);
        assert_eq!(id, id2);
        assert_eq!(interner.function_value(id), 42);
    }
}
