use thiserror::Error;

use crate::DataExpression;
use crate::DataVariable;
use crate::MutableIndexedSubstitution;

/// Rewrites a data expression to normal form under a substitution.
///
/// Kept abstract rather than wired to `symck_sabre` directly: `symck_sabre` already depends on
/// this crate (`rewrite_specification.rs` uses [`DataExpression`]), so a dependency in the
/// other direction would be circular. Callers plug in a concrete rewriter, matching the
/// "external collaborator" framing of the rewriter/enumerator pair.
pub trait Rewriter {
    fn rewrite(&mut self, expression: &DataExpression, sigma: &MutableIndexedSubstitution) -> DataExpression;
}

/// Supplies the candidate values considered for a quantified variable during enumeration.
///
/// A finite sort (booleans, a bounded numeric range, an enumerated datatype) yields its full
/// constructor set; for infinite sorts a caller-chosen bound keeps enumeration terminating,
/// exactly as the spec's `max_iterations`/fallback error do for the reachability loop built on
/// top of this.
pub trait VariableDomain {
    fn candidates(&self, variable: &DataVariable) -> Vec<DataExpression>;
}

/// A quantifier-free-after-instantiation element to enumerate: existentially bind
/// `variables` one at a time and evaluate `expression` under the resulting substitution.
pub struct EnumeratedElement {
    pub variables: Vec<DataVariable>,
    pub expression: DataExpression,
}

impl EnumeratedElement {
    pub fn new(variables: Vec<DataVariable>, expression: DataExpression) -> Self {
        EnumeratedElement { variables, expression }
    }
}

/// Returned by the enumeration callback to request early termination.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EnumerateControl {
    Continue,
    Stop,
}

#[derive(Error, Debug)]
pub enum EnumeratorError {
    #[error("enumeration of `{0}` exceeded the configured solution limit")]
    LimitExceeded(String),
}

/// Enumerates solutions of a boolean-sorted expression over a finite list of variables,
/// rewriting and backtracking left to right.
///
/// Implements the `enumerate(elt, sigma, yield, is_false_pred)` contract: variables are bound
/// in the order given by `elt.variables` (callers are expected to have applied
/// `order_summand_variables` beforehand), the partially-instantiated expression is rewritten
/// after each binding, and `is_false_pred` prunes any branch whose rewritten expression is
/// certainly false without enumerating its remaining variables.
pub struct Enumerator {
    max_solutions: Option<usize>,
}

impl Enumerator {
    /// Creates an enumerator that reports [`EnumeratorError::LimitExceeded`] once more than
    /// `max_solutions` solutions have been found for a single `enumerate` call. `None` means
    /// unbounded.
    pub fn new(max_solutions: Option<usize>) -> Self {
        Enumerator { max_solutions }
    }

    pub fn enumerate<R, D>(
        &self,
        elt: &EnumeratedElement,
        sigma: &mut MutableIndexedSubstitution,
        rewriter: &mut R,
        domain: &D,
        is_false: &dyn Fn(&DataExpression) -> bool,
        on_solution: &mut dyn FnMut(&MutableIndexedSubstitution, &DataExpression) -> EnumerateControl,
    ) -> Result<(), EnumeratorError>
    where
        R: Rewriter,
        D: VariableDomain,
    {
        let mut found = 0usize;
        self.enumerate_rec(&elt.variables, &elt.expression, sigma, rewriter, domain, is_false, on_solution, &mut found)?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn enumerate_rec<R, D>(
        &self,
        variables: &[DataVariable],
        expression: &DataExpression,
        sigma: &mut MutableIndexedSubstitution,
        rewriter: &mut R,
        domain: &D,
        is_false: &dyn Fn(&DataExpression) -> bool,
        on_solution: &mut dyn FnMut(&MutableIndexedSubstitution, &DataExpression) -> EnumerateControl,
        found: &mut usize,
    ) -> Result<EnumerateControl, EnumeratorError>
    where
        R: Rewriter,
        D: VariableDomain,
    {
        let Some((head, tail)) = variables.split_first() else {
            if is_false(expression) {
                return Ok(EnumerateControl::Continue);
            }

            *found += 1;
            if let Some(limit) = self.max_solutions {
                if *found > limit {
                    return Err(EnumeratorError::LimitExceeded(expression.to_string()));
                }
            }
            return Ok(on_solution(sigma, expression));
        };

        for candidate in domain.candidates(head) {
            sigma.assign(head, candidate);
            let narrowed = rewriter.rewrite(expression, sigma);

            if !is_false(&narrowed) {
                let control = self.enumerate_rec(tail, &narrowed, sigma, rewriter, domain, is_false, on_solution, found)?;
                if control == EnumerateControl::Stop {
                    sigma.unassign(head);
                    return Ok(EnumerateControl::Stop);
                }
            }
        }
        sigma.unassign(head);

        Ok(EnumerateControl::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DataFunctionSymbol;

    struct IdentityRewriter;

    impl Rewriter for IdentityRewriter {
        fn rewrite(&mut self, expression: &DataExpression, _sigma: &MutableIndexedSubstitution) -> DataExpression {
            expression.clone()
        }
    }

    struct BoolDomain;

    impl VariableDomain for BoolDomain {
        fn candidates(&self, _variable: &DataVariable) -> Vec<DataExpression> {
            vec![DataFunctionSymbol::new("true").into(), DataFunctionSymbol::new("false").into()]
        }
    }

    fn is_false(e: &DataExpression) -> bool {
        e.to_string() == "false"
    }

    #[test]
    fn test_enumerate_visits_every_combination() {
        let x = DataVariable::new("x");
        let y = DataVariable::new("y");
        let elt = EnumeratedElement::new(vec![x, y], DataFunctionSymbol::new("true").into());

        let mut sigma = MutableIndexedSubstitution::new();
        let mut rewriter = IdentityRewriter;
        let enumerator = Enumerator::new(None);

        let mut solutions = 0;
        enumerator
            .enumerate(&elt, &mut sigma, &mut rewriter, &BoolDomain, &is_false, &mut |_sigma, _value| {
                solutions += 1;
                EnumerateControl::Continue
            })
            .unwrap();

        assert_eq!(solutions, 4);
    }

    #[test]
    fn test_enumerate_stops_early() {
        let x = DataVariable::new("x");
        let y = DataVariable::new("y");
        let elt = EnumeratedElement::new(vec![x, y], DataFunctionSymbol::new("true").into());

        let mut sigma = MutableIndexedSubstitution::new();
        let mut rewriter = IdentityRewriter;
        let enumerator = Enumerator::new(None);

        let mut solutions = 0;
        enumerator
            .enumerate(&elt, &mut sigma, &mut rewriter, &BoolDomain, &is_false, &mut |_sigma, _value| {
                solutions += 1;
                EnumerateControl::Stop
            })
            .unwrap();

        assert_eq!(solutions, 1);
    }

    #[test]
    fn test_limit_exceeded_is_reported() {
        let x = DataVariable::new("x");
        let y = DataVariable::new("y");
        let elt = EnumeratedElement::new(vec![x, y], DataFunctionSymbol::new("true").into());

        let mut sigma = MutableIndexedSubstitution::new();
        let mut rewriter = IdentityRewriter;
        let enumerator = Enumerator::new(Some(2));

        let result = enumerator.enumerate(&elt, &mut sigma, &mut rewriter, &BoolDomain, &is_false, &mut |_sigma, _value| EnumerateControl::Continue);

        assert!(result.is_err());
    }
}
