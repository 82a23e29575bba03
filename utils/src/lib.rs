pub mod input;

use std::fmt::{Display, Error, Formatter};

/// An interned-ish, cheaply-cloneable symbol name (type/predicate/object/action name).
pub type Sym = arcstr::ArcStr;

/// Wraps a closure as a `Display` impl, letting a formatting function be built
/// on the fly instead of allocating a `String` up front.
pub struct Fmt<F>(pub F)
where
    F: Fn(&mut std::fmt::Formatter) -> std::fmt::Result;

impl<F> Display for Fmt<F>
where
    F: Fn(&mut std::fmt::Formatter) -> std::fmt::Result,
{
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        (self.0)(f)
    }
}

pub fn disp_iter<T: Display>(f: &mut Formatter<'_>, iterable: &[T], sep: &str) -> Result<(), Error> {
    let mut i = iterable.iter();
    if let Some(first) = i.next() {
        write!(f, "{first}")?;
        for other in i {
            write!(f, "{sep}{other}")?;
        }
    }
    Ok(())
}

pub use streaming_iterator::StreamingIterator;

/// Enumerates all combinations drawn from a vector of cloneable iterators,
/// e.g. `enumerate(vec![0..2, 5..7])` yields `[0,5] [0,6] [1,5] [1,6]`.
///
/// Used by the relational grounding back-end to iterate the cartesian product
/// of candidate bindings for a schema's free type columns before the join
/// predicates (precondition atoms) prune it down.
pub fn enumerate<Item, Iter: Iterator<Item = Item> + Clone>(
    generators: Vec<Iter>,
) -> impl StreamingIterator<Item = [Item]> {
    Combination::new(generators)
}

struct Combination<Item, Iterable> {
    gen: Vec<Iterable>,
    cur: Vec<Iterable>,
    sol: Vec<Item>,
    is_first: bool,
    finished: bool,
}

impl<Item, Iterable: Iterator<Item = Item> + Clone> Combination<Item, Iterable> {
    fn new(instances: Vec<Iterable>) -> Self {
        let size = instances.len();
        Combination {
            gen: instances.clone(),
            cur: instances,
            sol: Vec::with_capacity(size),
            is_first: true,
            finished: false,
        }
    }
}

impl<I, It: Iterator<Item = I> + Clone> StreamingIterator for Combination<I, It> {
    type Item = [I];

    fn advance(&mut self) {
        if self.finished {
            return;
        } else if self.is_first && self.gen.is_empty() {
            self.is_first = false;
            return;
        } else if !self.is_first {
            if self.sol.is_empty() {
                self.finished = true;
                return;
            }
            debug_assert!(self.sol.len() == self.gen.len());
            self.sol.pop();
        }
        self.is_first = false;
        loop {
            let lvl = self.sol.len();
            if let Some(i) = self.cur[lvl].next() {
                self.sol.push(i);
            } else {
                if self.sol.is_empty() {
                    self.finished = true;
                    return;
                }
                self.sol.pop();
                self.cur[lvl] = self.gen[lvl].clone();
                continue;
            }
            if self.sol.len() == self.gen.len() {
                return;
            }
        }
    }

    fn get(&self) -> Option<&[I]> {
        if self.finished || self.sol.len() != self.gen.len() {
            None
        } else {
            Some(self.sol.as_slice())
        }
    }
}
