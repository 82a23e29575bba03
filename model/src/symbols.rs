//! A symbol table assigns every declared name (type, predicate, object,
//! action schema) a dense [`SymId`], and lets the grounder iterate "all
//! objects of type T" as a contiguous range instead of a hash lookup.

use crate::types::{TypeHierarchy, TypeId};
use anyhow::{ensure, Result};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::fmt::{Debug, Formatter};
use strips_collections::create_ref_type;
use strips_collections::ref_store::RefVec;
use strips_utils::Sym;

create_ref_type!(SymId);

impl SymId {
    pub fn int_value(self) -> i32 {
        usize::from(self) as i32
    }
}

/// A contiguous run of symbol ids, typically "all instances of a type".
#[derive(Copy, Clone, Debug)]
pub struct ContiguousSymbols {
    first: usize,
    after_last: usize,
}

impl ContiguousSymbols {
    pub fn new(first: SymId, last_inclusive: SymId) -> Self {
        let last: usize = last_inclusive.into();
        ContiguousSymbols {
            first: first.into(),
            after_last: last + 1,
        }
    }

    pub fn empty() -> Self {
        ContiguousSymbols {
            first: 0,
            after_last: 0,
        }
    }

    pub fn singleton(item: SymId) -> Self {
        ContiguousSymbols::new(item, item)
    }

    pub fn size(self) -> u32 {
        (self.after_last.saturating_sub(self.first)) as u32
    }

    pub fn contains(self, sym: SymId) -> bool {
        let sym: usize = sym.into();
        self.first <= sym && sym < self.after_last
    }
}

impl Iterator for ContiguousSymbols {
    type Item = SymId;

    fn next(&mut self) -> Option<Self::Item> {
        if self.first < self.after_last {
            self.first += 1;
            Some(SymId::from(self.first - 1))
        } else {
            None
        }
    }
}

#[derive(Clone)]
pub struct SymbolTable {
    pub types: TypeHierarchy,
    symbols: Vec<Sym>,
    ids: HashMap<Sym, SymId>,
    symbol_types: RefVec<SymId, TypeId>,
    instances_by_exact_type: HashMap<TypeId, ContiguousSymbols>,
}

impl Debug for SymbolTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (i, x) in self.symbols.iter().enumerate() {
            writeln!(f, "{:?}\t<- {:?}", SymId::from(i), x)?;
        }
        Ok(())
    }
}

impl SymbolTable {
    pub fn empty() -> Self {
        Self::new(TypeHierarchy::empty(), Vec::new()).unwrap()
    }

    /// Builds the table from a type hierarchy and the set of `(symbol, type)`
    /// pairs for every declared object/predicate/action name. Symbols are
    /// stored grouped by type so that [`Self::instances_of_type`] can answer
    /// in O(1) without maintaining a separate per-type list.
    pub fn new(types: TypeHierarchy, symbols: Vec<(Sym, Sym)>) -> Result<Self> {
        let mut by_type: HashMap<TypeId, Vec<Sym>> = HashMap::new();
        for (sym, tpe) in symbols {
            let tpe_id = types
                .id_of(&tpe)
                .unwrap_or_else(|| panic!("Undeclared type: {tpe}"));
            by_type.entry(tpe_id).or_default().push(sym);
        }

        let mut table = SymbolTable {
            types,
            symbols: Default::default(),
            ids: Default::default(),
            symbol_types: Default::default(),
            instances_by_exact_type: Default::default(),
        };

        for tpe in table.types.types() {
            let first = table.symbols.len();
            for sym in by_type.remove(&tpe).unwrap_or_default() {
                ensure!(!table.ids.contains_key(&sym), "duplicated symbol: {sym}");
                let id = SymId::from(table.symbols.len());
                table.symbols.push(sym.clone());
                table.ids.insert(sym, id);
                let alias = table.symbol_types.push(tpe);
                debug_assert_eq!(id, alias);
            }
            let after_last = table.symbols.len();
            table
                .instances_by_exact_type
                .insert(tpe, ContiguousSymbols { first, after_last });
        }
        Ok(table)
    }

    pub fn id(&self, sym: &str) -> Option<SymId> {
        self.ids.get(sym).copied()
    }

    pub fn symbol(&self, id: SymId) -> &Sym {
        &self.symbols[usize::from(id)]
    }

    pub fn type_of(&self, id: SymId) -> TypeId {
        self.symbol_types[id]
    }

    /// All direct or indirect instances of `tpe`, as a single contiguous range.
    pub fn instances_of_type(&self, tpe: TypeId) -> ContiguousSymbols {
        let mut instances = *self
            .instances_by_exact_type
            .get(&tpe)
            .unwrap_or(&ContiguousSymbols::empty());
        let last = self.types.last_subtype(tpe);
        instances.after_last = self
            .instances_by_exact_type
            .get(&last)
            .map(|c| c.after_last)
            .unwrap_or(instances.after_last);
        instances
    }

    pub fn format(&self, sexpr: &[SymId]) -> String {
        let mut s = String::from("(");
        for (i, sym) in sexpr.iter().enumerate() {
            if i > 0 {
                s.push(' ');
            }
            write!(s, "{}", self.symbol(*sym)).unwrap();
        }
        s.push(')');
        s
    }
}

#[derive(Copy, Clone, Hash, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct TypedSym {
    pub sym: SymId,
    pub tpe: TypeId,
}

impl TypedSym {
    pub fn new(sym: SymId, tpe: TypeId) -> Self {
        TypedSym { sym, tpe }
    }
}

impl From<TypedSym> for SymId {
    fn from(ts: TypedSym) -> Self {
        ts.sym
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Sym {
        Sym::from(s)
    }

    pub fn table() -> SymbolTable {
        let types = TypeHierarchy::new(vec![
            (sym("object"), None),
            (sym("rover"), Some(sym("object"))),
            (sym("location"), Some(sym("object"))),
            (sym("predicate"), None),
        ])
        .unwrap();
        SymbolTable::new(
            types,
            vec![
                (sym("r1"), sym("rover")),
                (sym("l1"), sym("location")),
                (sym("l2"), sym("location")),
                (sym("at"), sym("predicate")),
                (sym("can-traverse"), sym("predicate")),
            ],
        )
        .unwrap()
    }

    #[test]
    fn instances() {
        let symbols = table();
        let object = symbols.types.id_of("object").unwrap();
        let rover = symbols.types.id_of("rover").unwrap();
        let location = symbols.types.id_of("location").unwrap();
        let predicate = symbols.types.id_of("predicate").unwrap();
        assert_eq!(symbols.instances_of_type(predicate).count(), 2);
        assert_eq!(symbols.instances_of_type(object).count(), 3);
        assert_eq!(symbols.instances_of_type(rover).count(), 1);
        assert_eq!(symbols.instances_of_type(location).count(), 2);
    }
}
