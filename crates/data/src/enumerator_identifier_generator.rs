/// Generates variable names guaranteed not to clash with previously generated ones, for use as
/// fresh quantifier variables introduced while enumerating or rewriting.
///
/// Ported from `enumerator_identifier_generator.h`, which wraps an
/// `atermpp::function_symbol_generator`; this does the same with a plain counter, since
/// variable names here are ordinary strings rather than interned function symbols.
#[derive(Default)]
pub struct IdentifierGenerator {
    counter: usize,
}

impl IdentifierGenerator {
    pub fn new() -> Self {
        IdentifierGenerator::default()
    }

    /// Returns a fresh identifier, distinct from every identifier returned before the last
    /// [`clear`](Self::clear).
    pub fn fresh(&mut self) -> String {
        let name = format!("@enum{}", self.counter);
        self.counter += 1;
        name
    }

    /// Resets the generator, allowing previously generated identifiers to be reused. Called
    /// once per top-level reachability run, matching the original's reset-per-run discipline.
    pub fn clear(&mut self) {
        self.counter = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_identifiers_are_distinct() {
        let mut gen = IdentifierGenerator::new();
        let a = gen.fresh();
        let b = gen.fresh();
        assert_ne!(a, b);
    }

    #[test]
    fn test_clear_resets_the_sequence() {
        let mut gen = IdentifierGenerator::new();
        let a = gen.fresh();
        gen.clear();
        let b = gen.fresh();
        assert_eq!(a, b);
    }
}
