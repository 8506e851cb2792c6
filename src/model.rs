//! Solver-independent description of a mixed-integer linear program.
//!
//! Formulations build a [`ModelSpec`]; a [`crate::solver::Solver`] turns it
//! into whatever the engine needs. Every model is a minimization.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(usize);

impl VarId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Binary,
    /// Continuous, bounded below by zero.
    Continuous,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VarDef {
    pub name: String,
    pub domain: Domain,
    pub upper: Option<f64>,
}

/// `Σ coeff·var + constant`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinExpr {
    terms: Vec<(VarId, f64)>,
    constant: f64,
}

impl LinExpr {
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn term(var: VarId, coeff: f64) -> Self {
        Self {
            terms: vec![(var, coeff)],
            constant: 0.0,
        }
    }

    pub fn terms(&self) -> &[(VarId, f64)] {
        &self.terms
    }

    pub fn constant_part(&self) -> f64 {
        self.constant
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(v, c)| c * values[v.0])
            .sum::<f64>()
            + self.constant
    }

    pub fn leq(self, rhs: impl Into<LinExpr>) -> (LinExpr, Relation) {
        (self - rhs.into(), Relation::Le)
    }

    pub fn geq(self, rhs: impl Into<LinExpr>) -> (LinExpr, Relation) {
        (self - rhs.into(), Relation::Ge)
    }

    pub fn equals(self, rhs: impl Into<LinExpr>) -> (LinExpr, Relation) {
        (self - rhs.into(), Relation::Eq)
    }
}

impl From<VarId> for LinExpr {
    fn from(var: VarId) -> Self {
        LinExpr::term(var, 1.0)
    }
}

impl From<f64> for LinExpr {
    fn from(value: f64) -> Self {
        LinExpr::constant(value)
    }
}

impl<T: Into<LinExpr>> Add<T> for LinExpr {
    type Output = LinExpr;

    fn add(mut self, rhs: T) -> LinExpr {
        self += rhs;
        self
    }
}

impl<T: Into<LinExpr>> AddAssign<T> for LinExpr {
    fn add_assign(&mut self, rhs: T) {
        let rhs = rhs.into();
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
    }
}

impl<T: Into<LinExpr>> Sub<T> for LinExpr {
    type Output = LinExpr;

    fn sub(self, rhs: T) -> LinExpr {
        self + (-rhs.into())
    }
}

impl Neg for LinExpr {
    type Output = LinExpr;

    fn neg(self) -> LinExpr {
        self * -1.0
    }
}

impl Mul<f64> for LinExpr {
    type Output = LinExpr;

    fn mul(mut self, rhs: f64) -> LinExpr {
        for (_, c) in &mut self.terms {
            *c *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Mul<f64> for VarId {
    type Output = LinExpr;

    fn mul(self, rhs: f64) -> LinExpr {
        LinExpr::term(self, rhs)
    }
}

impl Mul<VarId> for f64 {
    type Output = LinExpr;

    fn mul(self, rhs: VarId) -> LinExpr {
        LinExpr::term(rhs, self)
    }
}

impl<T: Into<LinExpr>> std::iter::Sum<T> for LinExpr {
    fn sum<I: Iterator<Item = T>>(iter: I) -> Self {
        iter.fold(LinExpr::default(), |acc, e| acc + e)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Le,
    Ge,
    Eq,
}

/// `expr (relation) 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub name: String,
    pub expr: LinExpr,
    pub relation: Relation,
}

impl Constraint {
    pub fn is_satisfied(&self, values: &[f64], tolerance: f64) -> bool {
        let v = self.expr.evaluate(values);
        match self.relation {
            Relation::Le => v <= tolerance,
            Relation::Ge => v >= -tolerance,
            Relation::Eq => v.abs() <= tolerance,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ModelSpec {
    name: String,
    variables: Vec<VarDef>,
    objective: LinExpr,
    constraints: Vec<Constraint>,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variables(&self) -> &[VarDef] {
        &self.variables
    }

    pub fn objective(&self) -> &LinExpr {
        &self.objective
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn add_var(&mut self, name: impl Into<String>, domain: Domain) -> VarId {
        self.variables.push(VarDef {
            name: name.into(),
            domain,
            upper: None,
        });
        VarId(self.variables.len() - 1)
    }

    pub fn binary(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, Domain::Binary)
    }

    pub fn continuous(&mut self, name: impl Into<String>) -> VarId {
        self.add_var(name, Domain::Continuous)
    }

    pub fn set_upper(&mut self, var: VarId, upper: f64) {
        self.variables[var.0].upper = Some(upper);
    }

    pub fn constrain(&mut self, name: impl Into<String>, (expr, relation): (LinExpr, Relation)) {
        self.constraints.push(Constraint {
            name: name.into(),
            expr,
            relation,
        });
    }

    pub fn set_objective(&mut self, objective: LinExpr) {
        self.objective = objective;
    }
}
