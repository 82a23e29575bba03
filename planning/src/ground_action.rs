//! C2: the operator-args interner. Hash-conses `(schema id, secondary id,
//! arg-tuple)` triples discovered reachable by C3, handing each a dense
//! [`GroundActionId`] consumed by C4's materializer.

use crate::facts::ArgObjVec;
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefPool;

create_ref_type!(GroundActionId);

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct GroundActionKey {
    pub schema: usize,
    /// Distinguishes conditional-effect branches of the same schema
    /// instance; always 0 here, since conditional effects are represented
    /// inline on a single ground operator rather than split into separate
    /// operator instances.
    pub secondary: u32,
    pub args: ArgObjVec,
}

#[derive(Default)]
pub struct OperatorArgsInterner {
    pool: RefPool<GroundActionId, GroundActionKey>,
}

impl OperatorArgsInterner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, schema: usize, secondary: u32, args: &[strips_model::symbols::SymId]) -> (GroundActionId, bool) {
        self.pool.intern(GroundActionKey { schema, secondary, args: args.iter().copied().collect() })
    }

    pub fn key(&self, id: GroundActionId) -> &GroundActionKey {
        self.pool.get(id)
    }

    pub fn len(&self) -> usize {
        self.pool.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pool.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = GroundActionId> + '_ {
        self.pool.keys()
    }

    /// Drops any interned triple whose secondary id is non-zero but whose
    /// primary (secondary = 0) variant for the same `(schema, args)` was
    /// never interned. A no-op in practice since this crate never interns
    /// secondary != 0 (see the field doc above), kept for contract fidelity.
    pub fn finalize(&self) -> Vec<GroundActionId> {
        let mut primaries: std::collections::HashSet<(usize, ArgObjVec)> = Default::default();
        for id in self.pool.keys() {
            let key = self.pool.get(id);
            if key.secondary == 0 {
                primaries.insert((key.schema, key.args.clone()));
            }
        }
        self.pool
            .keys()
            .filter(|&id| {
                let key = self.pool.get(id);
                key.secondary == 0 || primaries.contains(&(key.schema, key.args.clone()))
            })
            .collect()
    }
}
