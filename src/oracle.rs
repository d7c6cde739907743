//! The feasibility oracle the decomposer delegates constraint reasoning to.
//!
//! The decomposer never decides satisfiability itself: it hands conjunctions of constraints to an
//! [`Oracle`] and acts on the verdict. Two oracles are provided: [`SynOracle`], a deterministic
//! syntactic one with no external dependency, and [`SmtOracle`], which drives a Z3 process
//! through [`rsmt2`].
//!
//! [`Oracle`]: trait.Oracle.html (The Oracle trait)
//! [`SynOracle`]: struct.SynOracle.html (The SynOracle struct)
//! [`SmtOracle`]: struct.SmtOracle.html (The SmtOracle struct)
//! [`rsmt2`]: https://crates.io/crates/rsmt2

crate::prelude!();

use rsmt2::{print::Expr2Smt, SmtConf};

use expr::{Cst, Expr, Op};

#[cfg(test)]
mod test;

/// Verdict of a feasibility check over a region's path condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Feasibility {
    /// The path condition is satisfiable: some concrete input reaches the region.
    Feasible,
    /// The path condition is unsatisfiable.
    Infeasible,
    /// The oracle could not decide within its effort bounds.
    Unknown,
}
impl fmt::Display for Feasibility {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Feasible => write!(fmt, "feasible"),
            Self::Infeasible => write!(fmt, "infeasible"),
            Self::Unknown => write!(fmt, "unknown"),
        }
    }
}

/// Decides satisfiability of constraint conjunctions.
///
/// Implementations must be bounded-effort: returning [`Feasibility::Unknown`] is always
/// acceptable, looping forever is not. `Unknown` verdicts degrade precision, never correctness.
///
/// [`Feasibility::Unknown`]: enum.Feasibility.html#variant.Unknown
pub trait Oracle {
    /// Decides satisfiability of the conjunction of `constraints`.
    fn is_satisfiable(&mut self, constraints: &[Expr]) -> Res<Feasibility>;

    /// Heavyweight variant of [`is_satisfiable`], backing aggressive pruning.
    ///
    /// Implementations may unroll definitions and apply previously established facts here.
    /// Defaults to the plain check.
    ///
    /// [`is_satisfiable`]: #tymethod.is_satisfiable
    fn is_satisfiable_full(&mut self, constraints: &[Expr]) -> Res<Feasibility> {
        self.is_satisfiable(constraints)
    }

    /// True if `lft` and `rgt` are provably equal assuming `side`.
    fn evaluate_equal_under(&mut self, side: &Expr, lft: &Expr, rgt: &Expr) -> Res<bool>;
}

/// A purely syntactic oracle.
///
/// Flattens conjunctions, evaluates ground constraints, and reports
///
/// - `Infeasible` when some constraint evaluates to `false` or two constraints are syntactic
///   complements of each other,
/// - `Feasible` when every constraint evaluates to `true`,
/// - `Unknown` otherwise.
///
/// Equality under a side-condition is syntactic equality. This oracle is deterministic, runs
/// offline, and is what the test suite drives.
#[derive(Debug, Clone, Copy, Default)]
pub struct SynOracle;
impl SynOracle {
    /// Constructor.
    pub fn new() -> Self {
        Self
    }

    fn flatten<'a>(constraints: &'a [Expr], out: &mut Vec<&'a Expr>) {
        for constraint in constraints {
            Self::flatten_one(constraint, out)
        }
    }
    fn flatten_one<'a>(constraint: &'a Expr, out: &mut Vec<&'a Expr>) {
        match constraint {
            Expr::App { op: Op::And, args } => {
                for arg in args {
                    Self::flatten_one(arg, out)
                }
            }
            _ => out.push(constraint),
        }
    }
}
impl Oracle for SynOracle {
    fn is_satisfiable(&mut self, constraints: &[Expr]) -> Res<Feasibility> {
        let mut flat = Vec::with_capacity(constraints.len());
        Self::flatten(constraints, &mut flat);

        let mut all_true = true;
        for constraint in &flat {
            match constraint.eval() {
                Some(Cst::B(false)) => return Ok(Feasibility::Infeasible),
                Some(Cst::B(true)) => (),
                _ => all_true = false,
            }
        }
        for (idx, lft) in flat.iter().enumerate() {
            for rgt in &flat[idx + 1..] {
                if lft.complements(rgt) {
                    return Ok(Feasibility::Infeasible);
                }
            }
        }

        if all_true {
            Ok(Feasibility::Feasible)
        } else {
            Ok(Feasibility::Unknown)
        }
    }

    fn evaluate_equal_under(&mut self, _side: &Expr, lft: &Expr, rgt: &Expr) -> Res<bool> {
        Ok(lft == rgt)
    }
}

/// Negated equality between two borrowed expressions, for SMT-level printing.
struct NotEq<'a> {
    /// Left-hand side.
    lft: &'a Expr,
    /// Right-hand side.
    rgt: &'a Expr,
}
impl<'a> Expr2Smt<()> for NotEq<'a> {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "(not (= ")?;
        self.lft.expr_to_smt2(w, ())?;
        write!(w, " ")?;
        self.rgt.expr_to_smt2(w, ())?;
        write!(w, "))")?;
        Ok(())
    }
}

/// An SMT-backed oracle running a Z3 process through [`rsmt2`].
///
/// Each query runs in its own `push`/`pop` scope: free variables are declared as constants,
/// atomic call terms as uninterpreted functions, and the verdict comes from `check-sat`.
///
/// [`rsmt2`]: https://crates.io/crates/rsmt2
pub struct SmtOracle {
    /// Underlying SMT solver.
    solver: rsmt2::Solver<()>,
}
impl SmtOracle {
    /// Constructor.
    ///
    /// `z3_cmd` is the command to run Z3, with options separated by whitespace. If `tee` is
    /// provided, the whole SMT-LIB session is logged to that file.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use decomp::oracle::SmtOracle;
    /// let oracle = SmtOracle::new("z3 -smt2", None::<&str>).unwrap();
    /// # let _ = oracle;
    /// ```
    pub fn new(z3_cmd: impl Into<String>, tee: Option<impl AsRef<str>>) -> Res<Self> {
        let z3_cmd = z3_cmd.into();
        let mut split_cmd = z3_cmd.split(|c: char| c.is_whitespace());
        let cmd = split_cmd
            .next()
            .ok_or_else(|| format!("illegal Z3 command `{}`", z3_cmd))?
            .trim();
        let mut conf = SmtConf::z3(cmd);
        for opt in split_cmd {
            let opt = opt.trim();
            if !opt.is_empty() {
                conf.option(opt);
            }
        }
        conf.check_success();

        let mut solver = conf.spawn(()).chain_err(|| "while spawning z3 solver")?;
        if let Some(path) = tee {
            solver.path_tee(path.as_ref())?
        }
        Ok(Self { solver })
    }

    /// Destroys the oracle, killing the underlying solver process.
    pub fn kill(mut self) -> Res<()> {
        self.solver.kill().chain_err(|| "while killing z3 solver")?;
        Ok(())
    }

    /// Declares every free variable and every atomic call term appearing in `exprs`.
    ///
    /// Must run inside a `push`ed scope so the declarations vanish on `pop`.
    fn declare_syms(&mut self, exprs: &[&Expr]) -> Res<()> {
        let (mut vars, mut funs) = (Map::new(), Map::new());
        for expr in exprs {
            expr.collect_syms(&mut vars, &mut funs)
        }
        for (id, typ) in &vars {
            self.solver
                .declare_const(id, typ)
                .chain_err(|| format!("while declaring variable `{}`", id))?
        }
        for (name, (args, ret)) in &funs {
            self.solver
                .declare_fun(name, &args[..], ret)
                .chain_err(|| format!("while declaring function `{}`", name))?
        }
        Ok(())
    }

    fn check_scope(&mut self, constraints: &[Expr]) -> Res<Feasibility> {
        let refs: Vec<&Expr> = constraints.iter().collect();
        self.declare_syms(&refs)?;
        for constraint in constraints {
            self.solver
                .assert(constraint)
                .chain_err(|| format!("while asserting constraint `{}`", constraint))?
        }
        let res = match self.solver.check_sat_or_unk()? {
            Some(true) => Feasibility::Feasible,
            Some(false) => Feasibility::Infeasible,
            None => Feasibility::Unknown,
        };
        Ok(res)
    }
}
impl Oracle for SmtOracle {
    fn is_satisfiable(&mut self, constraints: &[Expr]) -> Res<Feasibility> {
        self.solver.push(1)?;
        let res = self.check_scope(constraints);
        self.solver.pop(1)?;
        res
    }

    fn evaluate_equal_under(&mut self, side: &Expr, lft: &Expr, rgt: &Expr) -> Res<bool> {
        self.solver.push(1)?;
        let res = (|| -> Res<bool> {
            self.declare_syms(&[side, lft, rgt])?;
            self.solver
                .assert(side)
                .chain_err(|| format!("while asserting side-condition `{}`", side))?;
            self.solver
                .assert(&NotEq { lft, rgt })
                .chain_err(|| format!("while asserting `{} != {}`", lft, rgt))?;
            let res = match self.solver.check_sat_or_unk()? {
                // No model where the two differ: provably equal under the side-condition.
                Some(false) => true,
                Some(true) | None => false,
            };
            Ok(res)
        })();
        self.solver.pop(1)?;
        res
    }
}
