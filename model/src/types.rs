//! The object-type hierarchy: a forest of named types rooted at implicit
//! top types, where each type's instances are exactly the instances of
//! itself and all of its descendants (a DAG restricted to single
//! inheritance, as is standard for typed PDDL).

use std::error::Error;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use strips_collections::create_ref_type;
use strips_collections::id_map::IdMap;
use strips_collections::ref_store::RefPool;
use strips_utils::Sym;

create_ref_type!(TypeId);

#[derive(Clone)]
pub struct TypeHierarchy {
    types: RefPool<TypeId, Sym>,
    /// For a type `t`, the id of the last (in declaration/DFS order) of its
    /// transitive subtypes; `t`'s instances span `[t, last_subtype(t)]`.
    last_subtype: IdMap<TypeId, TypeId>,
}

#[derive(Debug)]
pub struct UnreachableFromRoot(Vec<(Sym, Option<Sym>)>);

impl Error for UnreachableFromRoot {}

impl std::fmt::Display for UnreachableFromRoot {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Types not reachable from any root type: {:?}", self.0)
    }
}

impl TypeHierarchy {
    /// Builds the hierarchy from a set of `(type, optional-parent)` pairs.
    /// A type with no parent is a root (eventually subsumed by an implicit top type).
    pub fn new(mut types: Vec<(Sym, Option<Sym>)>) -> Result<Self, UnreachableFromRoot> {
        let mut sys = TypeHierarchy {
            types: Default::default(),
            last_subtype: Default::default(),
        };

        // depth-first traversal: each type's subtree occupies a contiguous id range.
        let mut trace: Vec<Option<Sym>> = vec![None];
        while let Some(parent) = trace.last().cloned() {
            match types.iter().position(|tup| tup.1 == parent) {
                Some(pos) => {
                    let child = types.remove(pos);
                    sys.types.push(child.0.clone());
                    trace.push(Some(child.0));
                }
                None => {
                    if let Some(p) = &parent {
                        let parent_id = sys.types.get_ref(p.as_str()).unwrap();
                        sys.last_subtype.insert(parent_id, sys.types.last_key().unwrap());
                    }
                    trace.pop();
                }
            }
        }
        if types.is_empty() {
            Ok(sys)
        } else {
            Err(UnreachableFromRoot(types))
        }
    }

    pub fn empty() -> Self {
        TypeHierarchy::new(Vec::new()).unwrap()
    }

    pub fn id_of(&self, tpe: &str) -> Option<TypeId> {
        self.types.get_ref(tpe)
    }

    pub fn name_of(&self, tid: TypeId) -> &Sym {
        self.types.get(tid)
    }

    pub fn is_subtype(&self, tpe: TypeId, possible_subtype: TypeId) -> bool {
        tpe <= possible_subtype && possible_subtype <= self.last_subtype(tpe)
    }

    pub fn last_subtype(&self, tpe: TypeId) -> TypeId {
        *self.last_subtype.get(tpe).unwrap_or(&tpe)
    }

    pub fn types(&self) -> impl Iterator<Item = TypeId> {
        self.types.keys()
    }
}

impl Debug for TypeHierarchy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for t in self.types() {
            writeln!(f, "{:?} <- {}", t, self.name_of(t))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Sym {
        Sym::from(s)
    }

    #[test]
    fn type_system() {
        let types = vec![
            (sym("A"), None),
            (sym("B"), None),
            (sym("A1"), Some(sym("A"))),
            (sym("A11"), Some(sym("A1"))),
            (sym("A2"), Some(sym("A"))),
            (sym("A12"), Some(sym("A1"))),
        ];
        let ts = TypeHierarchy::new(types).unwrap();
        let names = ["A", "B", "A1", "A11", "A12", "A2"];
        let ids: Vec<TypeId> = names.iter().map(|n| ts.id_of(n).unwrap()).collect();
        let [a, b, a1, a11, a12, a2] = ids[..] else { panic!() };
        assert!(ts.is_subtype(a, a));
        assert!(ts.is_subtype(a, a1));
        assert!(ts.is_subtype(a, a11));
        assert!(ts.is_subtype(a, a12));
        assert!(ts.is_subtype(a, a2));
        assert!(ts.is_subtype(a1, a1));
        assert!(ts.is_subtype(a1, a11));
        assert!(ts.is_subtype(a1, a12));
        assert!(!ts.is_subtype(a1, a));
        assert!(!ts.is_subtype(a, b));
        assert!(!ts.is_subtype(b, a));
    }
}
