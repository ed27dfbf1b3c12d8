//! Standard recursive form (SRF) PBES equations: each equation's right-hand side is a single
//! quantifier-free join (disjunctive or conjunctive) of summands of shape `Q v. f(v) && X(g(v))`.

use symck_aterm::ATerm;
use thiserror::Error;

use crate::FixpointSymbol;

/// A single `exists`/`forall`-quantified disjunct/conjunct `Q parameters. condition && X(arguments)`.
#[derive(Clone, Debug)]
pub struct SrfSummand {
    parameters: Vec<(String, ATerm)>,
    condition: ATerm,
    target: String,
    arguments: Vec<ATerm>,
}

impl SrfSummand {
    pub fn new(parameters: Vec<(String, ATerm)>, condition: ATerm, target: String, arguments: Vec<ATerm>) -> Self {
        Self { parameters, condition, target, arguments }
    }

    pub fn parameters(&self) -> &[(String, ATerm)] {
        &self.parameters
    }

    pub fn condition(&self) -> &ATerm {
        &self.condition
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn arguments(&self) -> &[ATerm] {
        &self.arguments
    }
}

/// A single equation in standard recursive form.
#[derive(Clone, Debug)]
pub struct SrfEquation {
    symbol: FixpointSymbol,
    name: String,
    parameters: Vec<(String, ATerm)>,
    summands: Vec<SrfSummand>,
    conjunctive: bool,
}

impl SrfEquation {
    pub fn new(symbol: FixpointSymbol, name: String, parameters: Vec<(String, ATerm)>, summands: Vec<SrfSummand>, conjunctive: bool) -> Self {
        Self { symbol, name, parameters, summands, conjunctive }
    }

    pub fn symbol(&self) -> FixpointSymbol {
        self.symbol
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[(String, ATerm)] {
        &self.parameters
    }

    pub fn summands(&self) -> &[SrfSummand] {
        &self.summands
    }

    pub fn is_conjunctive(&self) -> bool {
        self.conjunctive
    }

    /// Adds a `true`-guarded (conjunctive) or `false`-guarded (disjunctive) self-loop summand so
    /// that every equation has at least one applicable summand in every state, per I5.
    pub fn make_total(&mut self, true_summand: SrfSummand, false_summand: SrfSummand) {
        if self.conjunctive {
            self.summands.push(true_summand);
        } else {
            self.summands.push(false_summand);
        }
    }
}

/// A PBES in standard recursive form: a list of equations plus the initial propositional
/// variable instantiation.
#[derive(Clone, Debug)]
pub struct SrfPbes {
    equations: Vec<SrfEquation>,
    initial: (String, Vec<ATerm>),
}

impl SrfPbes {
    pub fn new(equations: Vec<SrfEquation>, initial: (String, Vec<ATerm>)) -> Self {
        Self { equations, initial }
    }

    pub fn equations(&self) -> &[SrfEquation] {
        &self.equations
    }

    pub fn equations_mut(&mut self) -> &mut Vec<SrfEquation> {
        &mut self.equations
    }

    pub fn initial(&self) -> &(String, Vec<ATerm>) {
        &self.initial
    }

    /// Adds the `true`-guarded and `false`-guarded self-loop summands to every equation.
    pub fn make_total(&mut self, default_sort: ATerm) {
        for equation in &mut self.equations {
            let true_summand = SrfSummand::new(Vec::new(), default_sort.clone(), "X_true".to_string(), Vec::new());
            let false_summand = SrfSummand::new(Vec::new(), default_sort.clone(), "X_false".to_string(), Vec::new());
            equation.make_total(true_summand, false_summand);
        }
    }

    /// Rewrites every equation so that all equations share one global parameter list: the union
    /// of every equation's own parameter list, in first-seen order. Parameters a given equation
    /// does not declare are padded with a fresh default value obtained from `fresh_default`, and
    /// every summand's target-variable argument list is padded in the same way.
    ///
    /// `fresh_default(sort)` must return a default-valued term of the given sort; callers
    /// typically source it from the global identifier generator of the data-index layer.
    pub fn unify_parameters(&mut self, fresh_default: impl Fn(&ATerm) -> ATerm) {
        let mut union: Vec<(String, ATerm)> = Vec::new();
        for equation in &self.equations {
            for parameter in equation.parameters() {
                if !union.iter().any(|(name, _)| name == &parameter.0) {
                    union.push(parameter.clone());
                }
            }
        }

        for equation in &mut self.equations {
            let missing: Vec<(String, ATerm)> = union
                .iter()
                .filter(|(name, _)| !equation.parameters.iter().any(|(n, _)| n == name))
                .cloned()
                .collect();

            if missing.is_empty() {
                continue;
            }

            let defaults: Vec<ATerm> = missing.iter().map(|(_, sort)| fresh_default(sort)).collect();

            for summand in &mut equation.summands {
                summand.arguments = defaults.iter().cloned().chain(summand.arguments.iter().cloned()).collect();
            }

            equation.parameters = missing.into_iter().chain(equation.parameters.iter().cloned()).collect();
        }
    }
}

/// A raw (not yet normalized) quantified boolean expression over data terms and propositional
/// variables: the input to [`run`]'s standard-recursive-form construction (§4.2 step 1).
///
/// A well-formed monotone PBES never negates a propositional-variable instantiation, only a
/// data subformula, so [`Not`](PbesExpression::Not) only ever wraps a
/// [`DataTerm`](PbesExpression::DataTerm) here.
#[derive(Clone, Debug)]
pub enum PbesExpression {
    DataTerm(ATerm),
    Not(Box<PbesExpression>),
    And(Box<PbesExpression>, Box<PbesExpression>),
    Or(Box<PbesExpression>, Box<PbesExpression>),
    Forall(Vec<(String, ATerm)>, Box<PbesExpression>),
    Exists(Vec<(String, ATerm)>, Box<PbesExpression>),
    PropositionalVariableInstantiation(String, Vec<ATerm>),
}

/// A single equation of a not-yet-normalized PBES.
#[derive(Clone, Debug)]
pub struct PbesEquation {
    symbol: FixpointSymbol,
    name: String,
    parameters: Vec<(String, ATerm)>,
    formula: PbesExpression,
}

impl PbesEquation {
    pub fn new(symbol: FixpointSymbol, name: String, parameters: Vec<(String, ATerm)>, formula: PbesExpression) -> Self {
        Self { symbol, name, parameters, formula }
    }
}

/// A PBES before standard-recursive-form normalization: its equations plus the initial
/// propositional-variable instantiation.
#[derive(Clone, Debug)]
pub struct Pbes {
    equations: Vec<PbesEquation>,
    initial: (String, Vec<ATerm>),
}

impl Pbes {
    pub fn new(equations: Vec<PbesEquation>, initial: (String, Vec<ATerm>)) -> Self {
        Self { equations, initial }
    }

    pub fn equations(&self) -> &[PbesEquation] {
        &self.equations
    }
}

/// Returns `pbes`'s initial propositional-variable instantiation: the vertex a reachability
/// search over [`run`]'s result should start from.
pub fn initial(pbes: &Pbes) -> (String, Vec<ATerm>) {
    pbes.initial.clone()
}

#[derive(Error, Debug)]
pub enum SrfNormalizeError {
    /// `equation` is not already shaped as a disjunction/conjunction of
    /// `Q v. f(v) && X(g(v))` summands this traversal can flatten. Nested or mismatched
    /// connectives, a negated propositional variable, or a bare data subformula under the
    /// "wrong" quantifier all land here: synthesizing a fresh equation for them would need a
    /// typed variable-reference layer this traversal does not have, so it reports the equation
    /// instead of silently emitting an incorrect one.
    #[error("equation `{0}` is not already in standard recursive form (nested/mismatched connectives or quantifiers)")]
    NotInStandardShape(String),
}

/// A top-level `And`/`Forall` makes an equation conjunctive (its summands combine with `&&`,
/// the "always" reading); anything else is treated as disjunctive, matching §4.2's two-case
/// SRF shape.
fn top_level_is_conjunctive(expr: &PbesExpression) -> bool {
    matches!(expr, PbesExpression::And(..) | PbesExpression::Forall(..))
}

/// Normalizes `formula` into the summand list of a single SRF equation (§4.2 step 1): walks
/// top-level `Or`/`And` chains (matching `conjunctive`), descends into a matching
/// `Exists`/`Forall` to read off its bound variables, and recognises `f(v) && X(g(v))` (in
/// either argument order) as well as a bare `X(g(v))` (no condition, i.e. `f = true`) or a bare
/// data subformula (no target, read against the `X_true` sink that [`SrfPbes::make_total`]
/// introduces).
fn flatten(formula: &PbesExpression, conjunctive: bool) -> Option<Vec<SrfSummand>> {
    match formula {
        PbesExpression::Or(left, right) if !conjunctive => {
            let mut summands = flatten(left, conjunctive)?;
            summands.extend(flatten(right, conjunctive)?);
            Some(summands)
        }
        PbesExpression::And(left, right) if conjunctive => {
            let mut summands = flatten(left, conjunctive)?;
            summands.extend(flatten(right, conjunctive)?);
            Some(summands)
        }
        PbesExpression::Exists(vars, body) if !conjunctive => decompose_summand(vars.clone(), body).map(|s| vec![s]),
        PbesExpression::Forall(vars, body) if conjunctive => decompose_summand(vars.clone(), body).map(|s| vec![s]),
        _ => decompose_summand(Vec::new(), formula).map(|s| vec![s]),
    }
}

fn true_term() -> ATerm {
    ATerm::constant(&symck_aterm::Symbol::new("true", 0))
}

/// Recognises the body of a (possibly absent, i.e. `vars` empty) quantifier as a single SRF
/// summand.
fn decompose_summand(vars: Vec<(String, ATerm)>, body: &PbesExpression) -> Option<SrfSummand> {
    match body {
        PbesExpression::And(left, right) => match (&**left, &**right) {
            (PbesExpression::DataTerm(f), PbesExpression::PropositionalVariableInstantiation(name, args)) => {
                Some(SrfSummand::new(vars, f.clone(), name.clone(), args.clone()))
            }
            (PbesExpression::PropositionalVariableInstantiation(name, args), PbesExpression::DataTerm(f)) => {
                Some(SrfSummand::new(vars, f.clone(), name.clone(), args.clone()))
            }
            _ => None,
        },
        PbesExpression::PropositionalVariableInstantiation(name, args) => Some(SrfSummand::new(vars, true_term(), name.clone(), args.clone())),
        PbesExpression::DataTerm(f) => Some(SrfSummand::new(vars, f.clone(), "X_true".to_string(), Vec::new())),
        _ => None,
    }
}

/// Runs the full SRF construction pipeline (§4.2 step 1): normalizes `pbes` to standard
/// recursive form, makes every equation total (so I5 holds unconditionally), and unifies every
/// equation's parameter list so a single global parameter vector can back a symbolic
/// transition relation.
///
/// `default_sort` is the boolean-like sort `make_total`'s sink equations are guarded by;
/// `fresh_default(sort)` must return a default-valued term of the given sort, as required by
/// [`SrfPbes::unify_parameters`].
pub fn run(pbes: &Pbes, default_sort: ATerm, fresh_default: impl Fn(&ATerm) -> ATerm) -> Result<SrfPbes, SrfNormalizeError> {
    let mut srf_equations = Vec::with_capacity(pbes.equations.len());
    for equation in &pbes.equations {
        let conjunctive = top_level_is_conjunctive(&equation.formula);
        let summands = flatten(&equation.formula, conjunctive).ok_or_else(|| SrfNormalizeError::NotInStandardShape(equation.name.clone()))?;
        srf_equations.push(SrfEquation::new(equation.symbol, equation.name.clone(), equation.parameters.clone(), summands, conjunctive));
    }

    let mut srf = SrfPbes::new(srf_equations, pbes.initial.clone());
    srf.make_total(default_sort);
    srf.unify_parameters(fresh_default);
    Ok(srf)
}

#[cfg(test)]
mod tests {
    use symck_aterm::Symbol;

    use super::*;

    fn bool_sort() -> ATerm {
        ATerm::constant(&Symbol::new("Bool", 0))
    }

    #[test]
    fn test_make_total_appends_according_to_conjunctive() {
        let mut conjunctive = SrfEquation::new(FixpointSymbol::Nu, "X".to_string(), Vec::new(), Vec::new(), true);
        conjunctive.make_total(
            SrfSummand::new(Vec::new(), bool_sort(), "X_true".to_string(), Vec::new()),
            SrfSummand::new(Vec::new(), bool_sort(), "X_false".to_string(), Vec::new()),
        );
        assert_eq!(conjunctive.summands().len(), 1);
        assert_eq!(conjunctive.summands()[0].target(), "X_true");

        let mut disjunctive = SrfEquation::new(FixpointSymbol::Mu, "Y".to_string(), Vec::new(), Vec::new(), false);
        disjunctive.make_total(
            SrfSummand::new(Vec::new(), bool_sort(), "X_true".to_string(), Vec::new()),
            SrfSummand::new(Vec::new(), bool_sort(), "X_false".to_string(), Vec::new()),
        );
        assert_eq!(disjunctive.summands()[0].target(), "X_false");
    }

    #[test]
    fn test_unify_parameters_pads_missing_parameters() {
        let eqn_x = SrfEquation::new(
            FixpointSymbol::Nu,
            "X".to_string(),
            vec![("n".to_string(), bool_sort())],
            vec![SrfSummand::new(Vec::new(), bool_sort(), "Y".to_string(), Vec::new())],
            true,
        );
        let eqn_y = SrfEquation::new(FixpointSymbol::Nu, "Y".to_string(), Vec::new(), Vec::new(), true);

        let mut pbes = SrfPbes::new(vec![eqn_x, eqn_y], ("X".to_string(), Vec::new()));
        pbes.unify_parameters(|sort| sort.clone());

        assert_eq!(pbes.equations()[0].parameters().len(), 1);
        assert_eq!(pbes.equations()[1].parameters().len(), 1);
        assert_eq!(pbes.equations()[1].parameters()[0].0, "n");
    }

    fn prop_var(name: &str) -> PbesExpression {
        PbesExpression::PropositionalVariableInstantiation(name.to_string(), Vec::new())
    }

    #[test]
    fn test_run_normalizes_disjunctive_equation_with_bare_propositional_variables() {
        let formula = PbesExpression::Or(Box::new(prop_var("Y")), Box::new(prop_var("Z")));
        let equation = PbesEquation::new(FixpointSymbol::Mu, "X".to_string(), Vec::new(), formula);
        let pbes = Pbes::new(vec![equation], ("X".to_string(), Vec::new()));

        let srf = run(&pbes, bool_sort(), |sort| sort.clone()).unwrap();

        assert_eq!(srf.equations().len(), 1);
        assert!(!srf.equations()[0].is_conjunctive());
        let targets: Vec<&str> = srf.equations()[0].summands().iter().map(|s| s.target()).collect();
        assert!(targets.contains(&"Y"));
        assert!(targets.contains(&"Z"));
        // make_total appended the disjunctive sink.
        assert!(targets.contains(&"X_false"));
    }

    #[test]
    fn test_run_decomposes_exists_guarded_summand() {
        let vars = vec![("n".to_string(), bool_sort())];
        let guarded = PbesExpression::And(Box::new(PbesExpression::DataTerm(bool_sort())), Box::new(prop_var("Y")));
        let formula = PbesExpression::Exists(vars.clone(), Box::new(guarded));
        let equation = PbesEquation::new(FixpointSymbol::Nu, "X".to_string(), Vec::new(), formula);
        let pbes = Pbes::new(vec![equation], ("X".to_string(), Vec::new()));

        let srf = run(&pbes, bool_sort(), |sort| sort.clone()).unwrap();

        let summand = srf.equations()[0].summands().iter().find(|s| s.target() == "Y").unwrap();
        assert_eq!(summand.parameters().len(), 1);
    }

    #[test]
    fn test_run_rejects_mismatched_connective() {
        // A disjunctive equation (top-level Or) whose summand is itself a mismatched And.
        let inner = PbesExpression::And(Box::new(prop_var("Y")), Box::new(prop_var("Z")));
        let formula = PbesExpression::Or(Box::new(inner), Box::new(prop_var("W")));
        let equation = PbesEquation::new(FixpointSymbol::Mu, "X".to_string(), Vec::new(), formula);
        let pbes = Pbes::new(vec![equation], ("X".to_string(), Vec::new()));

        assert!(run(&pbes, bool_sort(), |sort| sort.clone()).is_err());
    }

    #[test]
    fn test_initial_returns_entry_point_unchanged() {
        let pbes = Pbes::new(Vec::new(), ("X".to_string(), vec![bool_sort()]));
        assert_eq!(initial(&pbes), ("X".to_string(), vec![bool_sort()]));
    }
}
