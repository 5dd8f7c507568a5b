use std::collections::{BTreeSet, HashMap};

use super::{
    EvalError, Field, FormulaError,
    formula::{BinaryOp, Expr, Function},
};

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Const(f64),
    Arg(usize),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Call(Function, Vec<Node>),
}

/// An expression with each symbol bound to a position in an argument list.
#[derive(Debug, Clone, PartialEq)]
pub struct Compiled {
    root: Node,
    arity: usize,
}

impl Compiled {
    /// Binds the symbols of `expr` to positions in `argnames`.
    ///
    /// # Errors
    ///
    /// Returns [`FormulaError::DuplicateName`] if a name appears twice in
    /// `argnames`, or [`FormulaError::Mismatch`] unless the free symbols of
    /// `expr` are exactly the names in `argnames`.
    pub fn new(expr: &Expr, argnames: &[String]) -> Result<Self, FormulaError> {
        let mut declared = BTreeSet::new();
        let mut duplicates = BTreeSet::new();
        for name in argnames {
            if !declared.insert(name.as_str()) {
                duplicates.insert(name.clone());
            }
        }
        if !duplicates.is_empty() {
            return Err(FormulaError::DuplicateName {
                names: duplicates.into_iter().collect(),
            });
        }

        let symbols = expr.symbols();

        let missing: Vec<String> = symbols
            .iter()
            .filter(|symbol| !declared.contains(symbol.as_str()))
            .cloned()
            .collect();
        let unused: Vec<String> = argnames
            .iter()
            .filter(|name| !symbols.contains(name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() || !unused.is_empty() {
            return Err(FormulaError::Mismatch { missing, unused });
        }

        let index: HashMap<&str, usize> = argnames
            .iter()
            .enumerate()
            .map(|(i, name)| (name.as_str(), i))
            .collect();

        Ok(Self {
            root: bind(expr, &index),
            arity: argnames.len(),
        })
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Evaluates with `args` in the order of the names given at compile time.
    ///
    /// # Errors
    ///
    /// Returns [`EvalError::ShapeMismatch`] if per-cell arguments differ in
    /// length, or [`EvalError::Arity`] for the wrong number of arguments.
    pub fn eval(&self, args: &[Field]) -> Result<Field, EvalError> {
        if args.len() != self.arity {
            return Err(EvalError::Arity {
                expected: self.arity,
                found: args.len(),
            });
        }
        eval(&self.root, args)
    }
}

fn bind(expr: &Expr, index: &HashMap<&str, usize>) -> Node {
    match expr {
        Expr::Number(value) => Node::Const(*value),
        Expr::Symbol(name) => index
            .get(name.as_str())
            .map_or(Node::Const(f64::NAN), |&i| Node::Arg(i)),
        Expr::Neg(inner) => Node::Neg(Box::new(bind(inner, index))),
        Expr::Binary { op, lhs, rhs } => Node::Binary(
            *op,
            Box::new(bind(lhs, index)),
            Box::new(bind(rhs, index)),
        ),
        Expr::Call { func, args } => {
            Node::Call(*func, args.iter().map(|arg| bind(arg, index)).collect())
        }
    }
}

fn eval(node: &Node, args: &[Field]) -> Result<Field, EvalError> {
    Ok(match node {
        Node::Const(value) => Field::Scalar(*value),
        Node::Arg(i) => args[*i].clone(),
        Node::Neg(inner) => eval(inner, args)?.map(|x| -x),
        Node::Binary(op, lhs, rhs) => {
            let op = *op;
            eval(lhs, args)?.zip_with(eval(rhs, args)?, |a, b| op.apply(a, b))?
        }
        Node::Call(func, nodes) => {
            let func = *func;
            let mut result: Option<Field> = None;
            for node in nodes {
                let value = eval(node, args)?;
                result = Some(match result {
                    None => value,
                    Some(acc) => acc.zip_with(value, |a, b| func.combine(a, b))?,
                });
            }
            let value = result.unwrap_or(Field::Scalar(f64::NAN));
            if func.is_variadic() {
                value
            } else {
                value.map(|x| func.apply(x))
            }
        }
    })
}
