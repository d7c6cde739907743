//! Region decomposition of decision functions.
//!
//! Given a target [`fun::Def`], [`Decomp::decompose`] partitions its input domain into a finite
//! list of [`Region`]s. Each region carries the branch-path constraints that reach it and the
//! symbolic value the function computes along that path. The disjunction of all path conditions
//! covers the whole input domain; path conditions are pairwise disjoint unless a merging option
//! ([`Options::compound`] or [`Options::reduce_symmetry`]) combined some of them.
//!
//! Feasibility of path conditions is delegated to an [`oracle::Oracle`]. Oracle indecision is
//! never an error: undecided regions stay in the output tagged
//! [`Unknown`](../oracle/enum.Feasibility.html#variant.Unknown).
//!
//! [`fun::Def`]: ../fun/struct.Def.html (The Def struct)
//! [`Decomp::decompose`]: struct.Decomp.html#method.decompose
//! [`Region`]: struct.Region.html (The Region struct)
//! [`Options::compound`]: struct.Options.html#structfield.compound
//! [`Options::reduce_symmetry`]: struct.Options.html#structfield.reduce_symmetry
//! [`oracle::Oracle`]: ../oracle/trait.Oracle.html (The Oracle trait)

crate::prelude!();

use expr::{Cst, Expr, Op, Typ};
use fun::{Def, Defs, Mode};
use oracle::{Feasibility, Oracle};

#[cfg(test)]
mod test;

/// Options controlling a decomposition.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Side-condition narrowing the input domain.
    ///
    /// Must have the same signature shape as the target and produce `bool`. When present, every
    /// candidate region is checked in conjunction with it and infeasible candidates are dropped.
    pub assuming: Option<Def>,
    /// Check feasibility of every region's path condition and drop those proven infeasible.
    pub prune: bool,
    /// Merge candidate regions producing syntactically identical invariants, combining their
    /// path conditions disjunctively.
    pub compound: bool,
    /// Merge regions whose invariants are provably equal under the side-condition, and drop
    /// constraints the side-condition entails. No-op without a side-condition.
    pub reduce_symmetry: bool,
    /// Function names left unexpanded during traversal; their calls stay atomic.
    pub basis: Set<String>,
    /// Consult the definitions of basis functions when checking feasibility, without expanding
    /// them in reported constraints. Rejected when a basis function is self-recursive.
    pub interpret_basis: bool,
    /// Use the oracle's heavyweight check for feasibility, letting it unroll and apply
    /// previously established facts.
    pub aggressive_rec: bool,
}
impl Options {
    /// Constructor, everything off.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A symbolic partition of a function's input domain.
///
/// Immutable once produced: [`Decomp::refine`] builds a *new* region rather than mutating its
/// input, so already-returned regions stay valid.
///
/// [`Decomp::refine`]: struct.Decomp.html#method.refine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    /// Path condition, a conjunction. Empty means `true`.
    path: Vec<Expr>,
    /// Value computed along this path, possibly symbolic.
    invariant: Expr,
    /// Verdict of the last feasibility check over the path condition.
    feasibility: Feasibility,
}
impl Region {
    /// Path condition accessor.
    pub fn path(&self) -> &[Expr] {
        &self.path
    }
    /// Invariant accessor.
    pub fn invariant(&self) -> &Expr {
        &self.invariant
    }
    /// Feasibility accessor.
    pub fn feasibility(&self) -> Feasibility {
        self.feasibility
    }

    /// Pretty, multi-line string representation.
    pub fn to_ml_string(&self) -> String {
        let mut s = String::new();
        s.push_str("guard {\n");
        if self.path.is_empty() {
            s.push_str("    true,\n")
        } else {
            for constraint in &self.path {
                s.push_str("    ");
                s.push_str(&constraint.to_string());
                s.push_str(",\n")
            }
        }
        s.push_str("}\nvalue: ");
        s.push_str(&self.invariant.to_string());
        s.push_str("\nfeasibility: ");
        s.push_str(&self.feasibility.to_string());
        s
    }
}
impl fmt::Display for Region {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        if self.path.is_empty() {
            write!(fmt, "true")?
        } else {
            for (idx, constraint) in self.path.iter().enumerate() {
                if idx > 0 {
                    write!(fmt, " ")?
                }
                constraint.fmt(fmt)?
            }
        }
        write!(fmt, " => {}", self.invariant)
    }
}

/// A candidate region during traversal.
///
/// Holds one conjunction per merged emission slot; a freshly discovered candidate has exactly
/// one.
#[derive(Debug, Clone)]
struct Candidate {
    /// Conjunctions whose disjunction is the candidate's path condition.
    disjuncts: Vec<Vec<Expr>>,
    /// Value computed along the path(s).
    invariant: Expr,
}

/// A decomposition request over a definition registry.
///
/// # Examples
///
/// ```rust
/// use decomp::{
///     decomp::{Decomp, Options},
///     expr::{self, Typ, Var},
///     fun::{Def, Defs, Sig},
///     oracle::SynOracle,
/// };
///
/// // f(x) = if x > 0 { 1 } else { (- 1) }
/// let mut defs = Defs::new();
/// defs.register(Def::new(
///     "f",
///     Sig::new(vec![Var::new("x", Typ::Int)]),
///     Typ::Int,
///     expr::build!((ite (> (x: int) 0) 1 (- 1))),
/// ));
///
/// let mut decomp = Decomp::new(&defs, "f", Options::new(), SynOracle::new()).unwrap();
/// let regions = decomp.decompose().unwrap();
///
/// assert_eq!(regions.len(), 2);
/// assert_eq!(regions[0].path(), &[expr::build!((> (x: int) 0))][..]);
/// assert_eq!(regions[1].path(), &[expr::build!((<= (x: int) 0))][..]);
/// ```
pub struct Decomp<'d, O> {
    /// Definition registry, resolves calls during expansion.
    defs: &'d Defs,
    /// Target definition.
    target: &'d Def,
    /// Decomposition options.
    opts: Options,
    /// Feasibility oracle.
    oracle: O,
}
impl<'d, O> Decomp<'d, O>
where
    O: Oracle,
{
    /// Constructor.
    ///
    /// Validates the request: structural problems abort here, before any region is produced.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::MalformedFunction`] when the target is unknown as analyzable: opaque, or
    ///   carrying an unguarded self-call not abstracted by the basis, or when `interpret_basis`
    ///   is combined with a recursive basis function;
    /// - [`ErrorKind::InvalidSideCondition`] when the side-condition's signature shape differs
    ///   from the target's or its result type is not `bool`.
    ///
    /// [`ErrorKind::MalformedFunction`]: ../prelude/enum.ErrorKind.html
    /// [`ErrorKind::InvalidSideCondition`]: ../prelude/enum.ErrorKind.html
    pub fn new(defs: &'d Defs, target: &str, opts: Options, oracle: O) -> Res<Self> {
        let target = defs
            .get(target)
            .ok_or_else(|| format!("unknown function `{}`", target))?;
        if target.mode() == Mode::Opaque {
            bail!(ErrorKind::MalformedFunction(format!(
                "cannot decompose opaque function `{}`",
                target.name()
            )))
        }
        if target.has_unguarded_self_call() && !opts.basis.contains(target.name()) {
            bail!(ErrorKind::MalformedFunction(format!(
                "`{}` contains an unguarded recursive call; guard it or add `{}` to the basis",
                target.name(),
                target.name(),
            )))
        }
        if let Some(side) = &opts.assuming {
            if side.ret() != Typ::Bool {
                bail!(ErrorKind::InvalidSideCondition(format!(
                    "side-condition `{}` must produce `bool`, produces `{}`",
                    side.name(),
                    side.ret(),
                )))
            }
            if !side.sig().same_shape(target.sig()) {
                bail!(ErrorKind::InvalidSideCondition(format!(
                    "side-condition `{}` has signature ({}), target `{}` has ({})",
                    side.name(),
                    side.sig(),
                    target.name(),
                    target.sig(),
                )))
            }
        }
        if opts.interpret_basis {
            for name in &opts.basis {
                if let Some(def) = defs.get(name) {
                    if def.is_recursive() {
                        bail!(ErrorKind::MalformedFunction(format!(
                            "cannot interpret recursive basis function `{}`",
                            name
                        )))
                    }
                }
            }
        }
        Ok(Self {
            defs,
            target,
            opts,
            oracle,
        })
    }

    /// Target definition accessor.
    pub fn target(&self) -> &Def {
        self.target
    }
    /// Options accessor.
    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Decomposes the target into a covering list of regions.
    ///
    /// Regions come out in depth-first discovery order, then-branch before else-branch; merges
    /// collapse into the first-discovered member's slot. Regions the oracle cannot decide are
    /// kept and tagged [`Feasibility::Unknown`], preserving the covering property.
    ///
    /// [`Feasibility::Unknown`]: ../oracle/enum.Feasibility.html#variant.Unknown
    pub fn decompose(&mut self) -> Res<Vec<Region>> {
        let body = self.expand(self.target.body(), &mut vec![], false)?;
        let body = Self::hoist(&body);

        let mut cands = vec![];
        Self::walk(&mut vec![], &body, &mut cands);

        if self.opts.compound {
            cands = Self::merge_identical(cands);
        }

        let side = self.side_expr()?;
        let checks = self.opts.prune || self.opts.aggressive_rec || side.is_some();

        let mut kept: Vec<(Candidate, Feasibility)> = vec![];
        for cand in cands {
            let feasibility = if checks {
                let cs = self.oracle_constraints(&cand, side.as_ref())?;
                if self.opts.aggressive_rec {
                    self.oracle.is_satisfiable_full(&cs)?
                } else {
                    self.oracle.is_satisfiable(&cs)?
                }
            } else {
                Feasibility::Unknown
            };
            if checks && feasibility == Feasibility::Infeasible {
                continue;
            }
            kept.push((cand, feasibility));
        }

        if self.opts.reduce_symmetry {
            if let Some(side) = &side {
                self.reduce_symmetry(&mut kept, side)?;
            }
        }

        Ok(kept
            .into_iter()
            .map(|(cand, feasibility)| Self::into_region(cand, feasibility))
            .collect())
    }

    /// Adds `extra` constraints to a region's path condition and re-checks feasibility.
    ///
    /// Returns `None` when the augmented path condition is infeasible. Never mutates the input
    /// region; `refine(region, vec![])` produces a region equivalent to `region`.
    pub fn refine(&mut self, region: &Region, extra: Vec<Expr>) -> Res<Option<Region>> {
        let mut path = region.path.clone();
        path.extend(extra);

        let side = self.side_expr()?;
        let mut cs = path.clone();
        if let Some(side) = side {
            cs.push(side)
        }
        if self.opts.interpret_basis {
            cs = cs
                .iter()
                .map(|constraint| self.expand(constraint, &mut vec![], true))
                .collect::<Res<Vec<_>>>()?;
        }

        let feasibility = self.oracle.is_satisfiable(&cs)?;
        if feasibility == Feasibility::Infeasible {
            return Ok(None);
        }
        Ok(Some(Region {
            path,
            invariant: region.invariant.clone(),
            feasibility,
        }))
    }

    /// Inlines calls to analyzable, non-basis definitions.
    ///
    /// Self-calls of the target, basis calls (unless `through_basis`), opaque definitions,
    /// unknown functions and directly recursive helpers all stay atomic. A cycle through
    /// inlining of mutually recursive helpers is a structural error.
    fn expand(&self, expr: &Expr, stack: &mut Vec<String>, through_basis: bool) -> Res<Expr> {
        match expr {
            Expr::Cst(_) | Expr::Var(_) => Ok(expr.clone()),
            Expr::App { op, args } => {
                let args = args
                    .iter()
                    .map(|arg| self.expand(arg, stack, through_basis))
                    .collect::<Res<Vec<_>>>()?;
                Ok(Expr::App { op: *op, args })
            }
            Expr::Call { fun, args, typ } => {
                let args = args
                    .iter()
                    .map(|arg| self.expand(arg, stack, through_basis))
                    .collect::<Res<Vec<_>>>()?;
                let atomic = Expr::Call {
                    fun: fun.clone(),
                    args: args.clone(),
                    typ: *typ,
                };
                if fun == self.target.name() {
                    return Ok(atomic);
                }
                if self.opts.basis.contains(fun) && !through_basis {
                    return Ok(atomic);
                }
                let def = match self.defs.get(fun) {
                    Some(def) if def.mode() == Mode::Analyzable => def,
                    _ => return Ok(atomic),
                };
                if def.is_recursive() {
                    // cannot be finitely unrolled, abstract it
                    return Ok(atomic);
                }
                if stack.iter().any(|name| name == fun) {
                    bail!(ErrorKind::MalformedFunction(format!(
                        "cycle through inlining of `{}`",
                        fun
                    )))
                }
                let map = def
                    .sig()
                    .subst_map(&args)
                    .chain_err(|| format!("in call to `{}`", fun))?;
                let body = def.body().subst(&map);
                stack.push(fun.clone());
                let res = self.expand(&body, stack, through_basis);
                stack.pop();
                res
            }
        }
    }

    /// Lifts conditionals out of operator argument lists.
    ///
    /// `f(if c { a } else { b })` becomes `if c { f(a) } else { f(b) }`, so that every branching
    /// point ends up at boolean level where the traversal can split on it. Conditionals are not
    /// lifted across `Call` boundaries: calls are atomic terms.
    fn hoist(expr: &Expr) -> Expr {
        match expr {
            Expr::Cst(_) | Expr::Var(_) => expr.clone(),
            Expr::Call { fun, args, typ } => Expr::Call {
                fun: fun.clone(),
                args: args.iter().map(Self::hoist).collect(),
                typ: *typ,
            },
            Expr::App { op, args } => {
                let args: Vec<Expr> = args.iter().map(Self::hoist).collect();
                if *op != Op::Ite {
                    for (idx, arg) in args.iter().enumerate() {
                        let ite_args = match arg {
                            Expr::App {
                                op: Op::Ite,
                                args: ite_args,
                            } if ite_args.len() == 3 => ite_args,
                            _ => continue,
                        };
                        let (cnd, thn, els) = (
                            ite_args[0].clone(),
                            ite_args[1].clone(),
                            ite_args[2].clone(),
                        );
                        let mut thn_args = args.clone();
                        thn_args[idx] = thn;
                        let mut els_args = args.clone();
                        els_args[idx] = els;
                        return Expr::App {
                            op: Op::Ite,
                            args: vec![
                                cnd,
                                Self::hoist(&Expr::App {
                                    op: *op,
                                    args: thn_args,
                                }),
                                Self::hoist(&Expr::App {
                                    op: *op,
                                    args: els_args,
                                }),
                            ],
                        };
                    }
                }
                Expr::App { op: *op, args }
            }
        }
    }

    /// Depth-first traversal, records `(path, invariant)` candidates in discovery order.
    fn walk(path: &mut Vec<Expr>, expr: &Expr, out: &mut Vec<Candidate>) {
        match expr {
            Expr::App { op: Op::Ite, args } if args.len() == 3 => {
                for (constraints, holds) in Self::outcomes(&args[0]) {
                    let len = path.len();
                    path.extend(constraints);
                    Self::walk(path, if holds { &args[1] } else { &args[2] }, out);
                    path.truncate(len);
                }
            }
            _ => out.push(Candidate {
                disjuncts: vec![path.clone()],
                invariant: expr.clone(),
            }),
        }
    }

    /// Decision outcomes of a conditional's test.
    ///
    /// Decomposes the test through its `and`/`or`/`not`/`ite` structure down to atomic decision
    /// terms, yielding for each path through that structure the constraints taken (negated atoms
    /// in normalized form) and whether the test holds on that path. True outcomes come before
    /// their sibling false outcomes, preserving then-before-else emission order.
    fn outcomes(test: &Expr) -> Vec<(Vec<Expr>, bool)> {
        match test {
            Expr::Cst(Cst::B(b)) => vec![(vec![], *b)],
            Expr::App { op: Op::Not, args } if args.len() == 1 => Self::outcomes(&args[0])
                .into_iter()
                .map(|(constraints, holds)| (constraints, !holds))
                .collect(),
            Expr::App { op: Op::And, args } if !args.is_empty() => Self::conn_outcomes(args, true),
            Expr::App { op: Op::Or, args } if !args.is_empty() => Self::conn_outcomes(args, false),
            Expr::App { op: Op::Ite, args } if args.len() == 3 => {
                let mut res = vec![];
                for (constraints, holds) in Self::outcomes(&args[0]) {
                    let branch = if holds { &args[1] } else { &args[2] };
                    for (mut branch_constraints, branch_holds) in Self::outcomes(branch) {
                        let mut full = constraints.clone();
                        full.append(&mut branch_constraints);
                        res.push((full, branch_holds));
                    }
                }
                res
            }
            atom => vec![
                (vec![atom.clone()], true),
                (vec![atom.negated()], false),
            ],
        }
    }

    /// Decision outcomes of an n-ary conjunction (`conj`) or disjunction (`!conj`).
    fn conn_outcomes(args: &[Expr], conj: bool) -> Vec<(Vec<Expr>, bool)> {
        let (head, tail) = match args.split_first() {
            Some(pair) => pair,
            None => return vec![(vec![], conj)],
        };
        let mut res = vec![];
        for (constraints, holds) in Self::outcomes(head) {
            if holds != conj {
                // `false` decides a conjunction, `true` a disjunction
                res.push((constraints, !conj));
            } else if tail.is_empty() {
                res.push((constraints, conj));
            } else {
                for (mut rest_constraints, rest_holds) in Self::conn_outcomes(tail, conj) {
                    let mut full = constraints.clone();
                    full.append(&mut rest_constraints);
                    res.push((full, rest_holds));
                }
            }
        }
        res
    }

    /// Merges candidates with syntactically identical invariants into the first-discovered slot.
    fn merge_identical(cands: Vec<Candidate>) -> Vec<Candidate> {
        let mut res: Vec<Candidate> = vec![];
        for cand in cands {
            if let Some(prev) = res
                .iter_mut()
                .find(|prev| prev.invariant == cand.invariant)
            {
                prev.disjuncts.extend(cand.disjuncts);
            } else {
                res.push(cand);
            }
        }
        res
    }

    /// The side-condition instantiated over the target's parameters, expanded.
    fn side_expr(&self) -> Res<Option<Expr>> {
        let side = match &self.opts.assuming {
            Some(side) => side,
            None => return Ok(None),
        };
        let map: Map<String, Expr> = side
            .sig()
            .params()
            .iter()
            .zip(self.target.sig().params().iter())
            .map(|(side_param, target_param)| {
                (
                    side_param.id().to_string(),
                    Expr::new_var(target_param.clone()),
                )
            })
            .collect();
        let body = side.body().subst(&map);
        let expanded = self.expand(&body, &mut vec![], false)?;
        Ok(Some(expanded))
    }

    /// Constraints sent to the oracle for a candidate: its path condition, the side-condition,
    /// and basis semantics when `interpret_basis` is set. Reported constraints are unaffected.
    fn oracle_constraints(&self, cand: &Candidate, side: Option<&Expr>) -> Res<Vec<Expr>> {
        let mut cs = Self::path_of(&cand.disjuncts);
        if let Some(side) = side {
            cs.push(side.clone())
        }
        if self.opts.interpret_basis {
            cs = cs
                .iter()
                .map(|constraint| self.expand(constraint, &mut vec![], true))
                .collect::<Res<Vec<_>>>()?;
        }
        Ok(cs)
    }

    /// True if the side-condition entails `constraint`, *i.e.* `side ∧ ¬constraint` is
    /// infeasible.
    fn entailed_by_side(&mut self, side: &Expr, constraint: &Expr) -> Res<bool> {
        let mut cs = vec![side.clone(), constraint.negated()];
        if self.opts.interpret_basis {
            cs = cs
                .iter()
                .map(|constraint| self.expand(constraint, &mut vec![], true))
                .collect::<Res<Vec<_>>>()?;
        }
        Ok(self.oracle.is_satisfiable(&cs)? == Feasibility::Infeasible)
    }

    /// Second pass for `reduce_symmetry`: merges regions whose invariants coincide under the
    /// side-condition, then drops constraints the side-condition entails.
    fn reduce_symmetry(
        &mut self,
        kept: &mut Vec<(Candidate, Feasibility)>,
        side: &Expr,
    ) -> Res<()> {
        let mut idx = 0;
        while idx < kept.len() {
            let mut other = idx + 1;
            while other < kept.len() {
                let equal = {
                    let lft = kept[idx].0.invariant.clone();
                    let rgt = kept[other].0.invariant.clone();
                    self.oracle.evaluate_equal_under(side, &lft, &rgt)?
                };
                if equal {
                    let (cand, _) = kept.remove(other);
                    kept[idx].0.disjuncts.extend(cand.disjuncts);
                } else {
                    other += 1;
                }
            }
            idx += 1;
        }

        for (cand, _) in kept.iter_mut() {
            for disjunct in cand.disjuncts.iter_mut() {
                let mut retained = Vec::with_capacity(disjunct.len());
                for constraint in std::mem::take(disjunct) {
                    if self.entailed_by_side(side, &constraint)? {
                        continue;
                    }
                    retained.push(constraint)
                }
                *disjunct = retained;
            }
        }
        Ok(())
    }

    /// Builds a region's path condition from its disjuncts.
    ///
    /// A single disjunct is the conjunction itself. A disjunction containing an empty conjunct,
    /// or two complementary singleton conjuncts, covers everything and collapses to the empty
    /// (`true`) path.
    fn path_of(disjuncts: &[Vec<Expr>]) -> Vec<Expr> {
        if disjuncts.len() == 1 {
            return disjuncts[0].clone();
        }
        if disjuncts.iter().any(Vec::is_empty) {
            return vec![];
        }
        for (idx, lft) in disjuncts.iter().enumerate() {
            if lft.len() != 1 {
                continue;
            }
            for rgt in &disjuncts[idx + 1..] {
                if rgt.len() == 1 && lft[0].complements(&rgt[0]) {
                    return vec![];
                }
            }
        }
        vec![Expr::App {
            op: Op::Or,
            args: disjuncts.iter().map(|cs| Self::conj(cs)).collect(),
        }]
    }

    /// Conjunction of a constraint list.
    fn conj(constraints: &[Expr]) -> Expr {
        match constraints.len() {
            0 => Expr::from(true),
            1 => constraints[0].clone(),
            _ => Expr::App {
                op: Op::And,
                args: constraints.to_vec(),
            },
        }
    }

    fn into_region(cand: Candidate, feasibility: Feasibility) -> Region {
        Region {
            path: Self::path_of(&cand.disjuncts),
            invariant: cand.invariant,
            feasibility,
        }
    }
}
