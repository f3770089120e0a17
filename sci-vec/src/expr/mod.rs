//! The vector expression language.
//!
//! An expression combines numbers, vectors (optionally indexed, `v(2:5)`),
//! host operands and math-function calls with the usual arithmetic,
//! comparison, shift and logical operators. Every intermediate value is a
//! vector; a length-1 vector acts as a scalar and is broadcast against the
//! other operand.
//!
//! Host operands are `[script]`, evaluated by [`ExprHost::eval_script`],
//! `"text"`, passed through [`ExprHost::substitute`], and `{text}`, taken
//! literally. Their text must name a vector or list numbers separated by
//! whitespace.

mod eval;
pub mod functions;
mod lexer;
mod parser;

pub use functions::{FillFn, FunctionTable, MathFunction, PointFn, ScalarFn, VectorFn};

use crate::buffer::ValueBuffer;
use crate::error::{Error, Result};
use crate::store::VectorStore;
use eval::Evaluator;
use parser::Expr;

/// The interpreter embedding the vector engine.
pub trait ExprHost {
    /// Evaluate a bracketed script and return its textual result.
    fn eval_script(&mut self, script: &str) -> Result<String>;

    /// Perform substitutions on a quoted string.
    fn substitute(&mut self, text: &str) -> Result<String> {
        Ok(text.to_owned())
    }
}

/// A host that cannot run scripts and substitutes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl ExprHost for NoHost {
    fn eval_script(&mut self, script: &str) -> Result<String> {
        Err(Error::invalid_arg(script, "no interpreter to evaluate scripts"))
    }
}

/// A parsed expression, reusable across evaluations.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    ast: Expr,
}

impl Expression {
    /// Parse `source`, resolving function names against `functions`.
    pub fn parse(source: &str, functions: &FunctionTable) -> Result<Self> {
        Ok(Self {
            source: source.to_owned(),
            ast: parser::parse(source, functions)?,
        })
    }

    /// The text this expression was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against the vectors of `store`. Nothing in the store is
    /// modified.
    pub fn eval(&self, store: &VectorStore, host: &mut dyn ExprHost) -> Result<ValueBuffer> {
        let mut evaluator = Evaluator { store, host };
        evaluator.eval(&self.ast).map(ValueBuffer::from_vec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Answers a few fixed scripts and expands `$n` in quoted text.
    #[derive(Default)]
    struct Scripted {
        scripts: Vec<String>,
    }

    impl ExprHost for Scripted {
        fn eval_script(&mut self, script: &str) -> Result<String> {
            self.scripts.push(script.to_owned());
            match script {
                "list" => Ok(" 1 2 3 ".to_owned()),
                "name" => Ok("y".to_owned()),
                "nothing" => Ok(String::new()),
                other => Err(Error::invalid_arg(other, "unknown command")),
            }
        }

        fn substitute(&mut self, text: &str) -> Result<String> {
            Ok(text.replace("$n", "4"))
        }
    }

    fn store_with(vectors: &[(&str, &[f64])]) -> VectorStore {
        let mut store = VectorStore::default();
        for (name, values) in vectors {
            let id = store.create(Some(*name)).expect("create");
            store.update(id, |v| v.set_values(values)).expect("set");
        }
        store.run_idle();
        store
    }

    fn eval(store: &VectorStore, source: &str, host: &mut dyn ExprHost) -> Result<Vec<f64>> {
        store.evaluate(source, host).map(ValueBuffer::into_vec)
    }

    #[test]
    fn ranged_operands_follow_the_offset_and_direction() {
        let mut store = store_with(&[("v", &[1.0, 2.0, 3.0, 4.0])]);
        assert_eq!(eval(&store, "v(1:2) * 2", &mut NoHost), Ok(vec![4.0, 6.0]));
        assert_eq!(eval(&store, "v(max) - v(min)", &mut NoHost), Ok(vec![3.0]));

        let v = store.lookup("v").expect("v");
        store.get_mut(v).expect("v").set_offset(1);
        assert_eq!(eval(&store, "v(1:2) * 2", &mut NoHost), Ok(vec![2.0, 4.0]));
        assert_eq!(eval(&store, "v(end:1) + 0", &mut NoHost), Ok(vec![4.0, 3.0, 2.0, 1.0]));
        assert!(matches!(
            eval(&store, "v(0:2)", &mut NoHost),
            Err(Error::BadIndex { .. })
        ));
    }

    #[test]
    fn unknown_vectors_are_not_found() {
        let store = store_with(&[("v", &[1.0])]);
        assert_eq!(
            eval(&store, "v + w", &mut NoHost),
            Err(Error::NotFound {
                name: "w".to_owned()
            })
        );
        assert!(matches!(
            eval(&store, "w(1:2)", &mut NoHost),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn a_domain_error_aborts_the_whole_assignment() {
        let mut store = store_with(&[("x", &[4.0, -1.0, 9.0]), ("y", &[7.0])]);
        let y = store.lookup("y").expect("y");
        assert_eq!(
            store.assign_expr(y, "sqrt(x)", &mut NoHost),
            Err(Error::domain("sqrt", -1.0))
        );
        assert_eq!(store.get(y).expect("y").values(), &[7.0]);
        assert!(!store.is_pending(y).expect("pending"));
    }

    #[test]
    fn host_operands_become_vectors() {
        let store = store_with(&[("y", &[10.0, 20.0, 30.0])]);
        let mut host = Scripted::default();
        assert_eq!(eval(&store, "[list] * 2", &mut host), Ok(vec![2.0, 4.0, 6.0]));
        assert_eq!(eval(&store, "[name] + [list]", &mut host), Ok(vec![11.0, 22.0, 33.0]));
        assert_eq!(eval(&store, "\"$n 5\" * 2", &mut host), Ok(vec![8.0, 10.0]));
        assert_eq!(eval(&store, "{5 6} + 1", &mut host), Ok(vec![6.0, 7.0]));
        assert_eq!(host.scripts, vec!["list", "name", "list"]);

        assert_eq!(
            eval(&store, "[nothing] + 1", &mut host),
            Err(Error::parse("empty operand"))
        );
        assert!(matches!(
            eval(&store, "\"a b\"", &mut host),
            Err(Error::Parse { .. })
        ));
        assert!(matches!(
            eval(&store, "[oops]", &mut host),
            Err(Error::InvalidArg { .. })
        ));
        assert!(matches!(
            eval(&store, "[list]", &mut NoHost),
            Err(Error::InvalidArg { .. })
        ));
    }
}
