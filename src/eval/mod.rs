//! The Formula Evaluator: compiles rate and guard expressions once, then
//! evaluates them cheaply per tick against a binding set (place tokens,
//! `time`, `dt`) and the closed function catalogue in [`functions`].

pub mod ast;
pub mod functions;
pub mod lexer;
pub mod parser;

use std::collections::HashMap;

use ast::BinOp;
use ast::Expr;
use ast::UnOp;
use rand::RngCore;

/// A compiled expression, ready to evaluate without re-parsing. Carries its
/// own copy of the source text for diagnostics.
#[derive(Debug, Clone)]
pub struct Program {
    source: String,
    expr: Expr,
}

/// Bindings available during evaluation: place tokens plus `time` and `dt`.
pub type Bindings = HashMap<String, f64>;

impl Program {
    /// Compiles `source`, rejecting unknown identifiers and unknown function
    /// calls against `known_vars` (typically place names) up front; `time`
    /// and `dt` are always implicitly known.
    pub fn compile(source: &str, known_vars: &std::collections::HashSet<String>) -> anyhow::Result<Self> {
        let tokens = lexer::lex(source)?;
        let expr = parser::parse(&tokens)?;
        check_identifiers(&expr, known_vars)
            .map_err(|name| anyhow::anyhow!("unknown identifier {:?} in expression {:?}", name, source))?;
        Ok(Self {
            source: source.to_string(),
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn eval(&self, bindings: &Bindings, rng: &mut dyn RngCore) -> anyhow::Result<f64> {
        eval_expr(&self.expr, bindings, rng)
    }

    /// Evaluates as a guard: any non-zero result is truthy, matching the
    /// dynamically-typed guard convention in the source material.
    pub fn eval_bool(&self, bindings: &Bindings, rng: &mut dyn RngCore) -> anyhow::Result<bool> {
        Ok(self.eval(bindings, rng)? != 0.0)
    }
}

fn check_identifiers(expr: &Expr, known_vars: &std::collections::HashSet<String>) -> Result<(), String> {
    match expr {
        Expr::Number(_) => Ok(()),
        Expr::Var(name) => {
            if name == "time" || name == "dt" || known_vars.contains(name) {
                Ok(())
            } else {
                Err(name.clone())
            }
        }
        Expr::Unary(_, inner) => check_identifiers(inner, known_vars),
        Expr::Binary(_, lhs, rhs) => {
            check_identifiers(lhs, known_vars)?;
            check_identifiers(rhs, known_vars)
        }
        Expr::Call(name, args) => {
            if !functions::is_known(name) {
                return Err(name.clone());
            }
            for arg in args {
                check_identifiers(arg, known_vars)?;
            }
            Ok(())
        }
    }
}

fn eval_expr(expr: &Expr, bindings: &Bindings, rng: &mut dyn RngCore) -> anyhow::Result<f64> {
    match expr {
        Expr::Number(n) => Ok(*n),
        Expr::Var(name) => bindings
            .get(name)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("unbound identifier {:?} at evaluation time", name)),
        Expr::Unary(UnOp::Neg, inner) => Ok(-eval_expr(inner, bindings, rng)?),
        Expr::Unary(UnOp::Not, inner) => Ok(if eval_expr(inner, bindings, rng)? == 0.0 { 1.0 } else { 0.0 }),
        Expr::Binary(op, lhs, rhs) => {
            let a = eval_expr(lhs, bindings, rng)?;
            let b = eval_expr(rhs, bindings, rng)?;
            Ok(match op {
                BinOp::Add => a + b,
                BinOp::Sub => a - b,
                BinOp::Mul => a * b,
                BinOp::Div => a / b,
                BinOp::Pow => a.powf(b),
                BinOp::Lt => bool_to_f64(a < b),
                BinOp::Le => bool_to_f64(a <= b),
                BinOp::Gt => bool_to_f64(a > b),
                BinOp::Ge => bool_to_f64(a >= b),
                BinOp::Eq => bool_to_f64(a == b),
                BinOp::Ne => bool_to_f64(a != b),
                BinOp::And => bool_to_f64(a != 0.0 && b != 0.0),
                BinOp::Or => bool_to_f64(a != 0.0 || b != 0.0),
            })
        }
        Expr::Call(name, args) => {
            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(eval_expr(arg, bindings, rng)?);
            }
            functions::call(name, &values, rng)
        }
    }
}

fn bool_to_f64(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}
