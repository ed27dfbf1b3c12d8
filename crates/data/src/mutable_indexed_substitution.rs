use std::collections::HashMap;
use std::fmt;

use crate::DataExpression;
use crate::DataVariable;

/// A substitution from data variables to data expressions, backed by a dense `Vec` indexed by
/// variable slot rather than a per-lookup hash of the assigned value.
///
/// Ported from `mutable_indexed_substitution.h`: `m_container` holds the assigned values,
/// `m_index_table` maps a variable to its slot in `m_container`, and `m_free_positions` is a
/// stack of slots freed by [`unassign`](Self::unassign) so they can be reused instead of
/// growing `m_container` without bound. Variables are identified by their name and sort rather
/// than by the underlying term's address, since this crate does not (yet) expose a stable
/// `atermpp`-style index for a [`DataVariable`].
#[derive(Default)]
pub struct MutableIndexedSubstitution {
    container: Vec<Option<DataExpression>>,
    index_table: HashMap<String, usize>,
    free_positions: Vec<usize>,
}

impl MutableIndexedSubstitution {
    pub fn new() -> Self {
        MutableIndexedSubstitution::default()
    }

    fn key(variable: &DataVariable) -> String {
        format!("{}: {}", variable.name(), variable.sort())
    }

    fn slot(&mut self, variable: &DataVariable) -> usize {
        let key = Self::key(variable);
        if let Some(&index) = self.index_table.get(&key) {
            return index;
        }

        let index = match self.free_positions.pop() {
            Some(index) => index,
            None => {
                self.container.push(None);
                self.container.len() - 1
            }
        };
        self.index_table.insert(key, index);
        index
    }

    /// Assigns `value` to `variable`, overwriting any previous assignment.
    pub fn assign(&mut self, variable: &DataVariable, value: DataExpression) {
        let index = self.slot(variable);
        self.container[index] = Some(value);
    }

    /// Removes the assignment for `variable`, if any, freeing its slot for reuse.
    pub fn unassign(&mut self, variable: &DataVariable) {
        let key = Self::key(variable);
        if let Some(index) = self.index_table.remove(&key) {
            self.container[index] = None;
            self.free_positions.push(index);
        }
    }

    /// Returns the value assigned to `variable`, or `variable` itself if it is unassigned.
    pub fn get(&self, variable: &DataVariable) -> DataExpression {
        if let Some(&index) = self.index_table.get(&Self::key(variable)) {
            if let Some(value) = &self.container[index] {
                return value.clone();
            }
        }
        variable.clone().into()
    }

    /// Whether this substitution has no assignments.
    pub fn is_empty(&self) -> bool {
        self.index_table.is_empty()
    }

    /// Removes every assignment, keeping the allocated slots for reuse.
    pub fn clear(&mut self) {
        for value in self.container.iter_mut() {
            *value = None;
        }
        self.free_positions = (0..self.container.len()).collect();
        self.index_table.clear();
    }
}

impl fmt::Display for MutableIndexedSubstitution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.index_table.iter().collect();
        entries.sort_by(|a, b| a.0.cmp(b.0));

        write!(f, "[")?;
        for (i, (name, &index)) in entries.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            if let Some(value) = &self.container[index] {
                write!(f, "{name} := {value}")?;
            }
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unassigned_variable_maps_to_itself() {
        let sigma = MutableIndexedSubstitution::new();
        let v = DataVariable::new("x");
        assert_eq!(sigma.get(&v).to_string(), "x");
    }

    #[test]
    fn test_assign_then_unassign_restores_identity() {
        let mut sigma = MutableIndexedSubstitution::new();
        let v = DataVariable::new("x");
        let w = DataVariable::new("y");

        sigma.assign(&v, w.clone().into());
        assert_eq!(sigma.get(&v).to_string(), "y");
        assert!(!sigma.is_empty());

        sigma.unassign(&v);
        assert_eq!(sigma.get(&v).to_string(), "x");
        assert!(sigma.is_empty());
    }

    #[test]
    fn test_freed_slot_is_reused() {
        let mut sigma = MutableIndexedSubstitution::new();
        let v = DataVariable::new("x");
        let w = DataVariable::new("y");

        sigma.assign(&v, v.clone().into());
        sigma.unassign(&v);
        sigma.assign(&w, w.clone().into());

        assert_eq!(sigma.container.iter().filter(|v| v.is_some()).count(), 1);
    }
}
