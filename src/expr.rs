//! Defines the expression structure used to represent decision functions and constraints.

crate::prelude!();

use rsmt2::print::{Expr2Smt, Sort2Smt, Sym2Smt};


pub use crate::{build_expr as build, build_typ};

/// A type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Typ {
    /// Bool type.
    Bool,
    /// Integer type.
    Int,
    /// Rational type.
    Rat,
}
impl Typ {
    /// Creates a bool type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::expr::Typ;
    /// let bool_typ = Typ::bool();
    /// assert_eq!(&bool_typ.to_string(), "bool")
    /// ```
    pub fn bool() -> Self {
        Self::Bool
    }
    /// Creates an integer type.
    pub fn int() -> Self {
        Self::Int
    }
    /// Creates a rational type.
    pub fn rat() -> Self {
        Self::Rat
    }

    /// True if the type is an arithmetic one.
    pub fn is_arith(self) -> bool {
        match self {
            Self::Bool => false,
            Self::Int | Self::Rat => true,
        }
    }
}
impl Sort2Smt for Typ {
    fn sort_to_smt2<W: Write>(&self, w: &mut W) -> SmtRes<()> {
        write!(
            w,
            "{}",
            match self {
                Self::Bool => "Bool",
                Self::Int => "Int",
                Self::Rat => "Real",
            }
        )?;
        Ok(())
    }
}

/// Constants.
///
/// Currently only booleans, integers and rationals are supported.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Cst {
    /// Bool constant.
    B(bool),
    /// Integer constant.
    I(Int),
    /// Rational constant.
    R(Rat),
}
impl HasTyp for Cst {
    fn typ(&self) -> Typ {
        match self {
            Self::B(_) => Typ::Bool,
            Self::I(_) => Typ::Int,
            Self::R(_) => Typ::Rat,
        }
    }
}
impl Cst {
    /// Creates a boolean constant.
    pub fn bool(b: bool) -> Self {
        Cst::B(b)
    }
    /// Creates an integer constant.
    pub fn int<I: Into<Int>>(i: I) -> Self {
        Cst::I(i.into())
    }
    /// Creates a rational constant.
    pub fn rat<R: Into<Rat>>(r: R) -> Self {
        Cst::R(r.into())
    }
}
impl Expr2Smt<()> for Cst {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self {
            Self::B(b) => write!(w, "{}", b)?,
            Self::I(i) => write!(w, "{}", i)?,
            Self::R(r) => write!(w, "(/ {} {})", r.numer(), r.denom())?,
        }
        Ok(())
    }
}

/// Operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Op {
    /// If-then-else.
    Ite,
    /// Boolean implication.
    Implies,
    /// Addition.
    Add,
    /// Subtraction, or negation when unary.
    Sub,
    /// Multiplication.
    Mul,
    /// Rational division.
    Div,
    /// Integer division.
    IDiv,
    /// Integer modulo.
    Mod,
    /// Greater than or equal to.
    Ge,
    /// Less than or equal to.
    Le,
    /// Greater than.
    Gt,
    /// Less than.
    Lt,
    /// Equality.
    Eq,
    /// Boolean negation.
    Not,
    /// Boolean conjunction.
    And,
    /// Boolean disjunction.
    Or,
}
impl Op {
    /// True if `self` is an arithmetic relation.
    pub fn is_arith_relation(self) -> bool {
        match self {
            Self::Ge | Self::Le | Self::Gt | Self::Lt => true,
            Self::Ite
            | Self::Implies
            | Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::IDiv
            | Self::Mod
            | Self::Eq
            | Self::Not
            | Self::And
            | Self::Or => false,
        }
    }

    /// Minimal arity of `self`.
    pub fn min_arity(self) -> usize {
        match self {
            Self::Not | Self::Add | Self::Sub => 1,
            Self::Mod
            | Self::Mul
            | Self::Div
            | Self::IDiv
            | Self::And
            | Self::Or
            | Self::Implies
            | Self::Eq
            | Self::Le
            | Self::Lt
            | Self::Ge
            | Self::Gt => 2,
            Self::Ite => 3,
        }
    }

    /// Maximal arity for `self`, `None` if infinite.
    pub fn max_arity(self) -> Option<usize> {
        match self {
            Self::Not => Some(1),
            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::And
            | Self::Or
            | Self::Implies
            | Self::Eq
            | Self::Le
            | Self::Lt
            | Self::Ge
            | Self::Gt => None,
            Self::Mod | Self::Div | Self::IDiv => Some(2),
            Self::Ite => Some(3),
        }
    }

    /// Type-checks an operator application.
    pub fn type_check(self, args: &[Expr]) -> Res<Typ> {
        if args.len() < self.min_arity() {
            bail!(
                "`{}` expects at least {} argument(s)",
                self,
                self.min_arity(),
            )
        }
        if let Some(max) = self.max_arity() {
            if args.len() > max {
                bail!("`{}` expects at most {} argument(s)", self, max)
            }
        }

        let typ = match self {
            Self::Ite => {
                let typ = args[0].typ();
                if typ != Typ::Bool {
                    bail!("expected first argument of type `bool`, got `{}`", typ)
                }

                let thn_typ = args[1].typ();
                let els_typ = args[2].typ();

                if thn_typ != els_typ {
                    bail!(
                        "`{}`'s second and third arguments should have the same type, got `{}` and `{}`",
                        self, thn_typ, els_typ,
                    )
                }

                thn_typ
            }
            Self::Implies | Self::And | Self::Or | Self::Not => {
                if args.iter().any(|e| e.typ() != Typ::Bool) {
                    bail!("`{}`'s arguments must all be boolean expressions", self)
                }
                Typ::Bool
            }

            Self::Add
            | Self::Sub
            | Self::Mul
            | Self::Div
            | Self::IDiv
            | Self::Mod
            | Self::Le
            | Self::Ge
            | Self::Lt
            | Self::Gt => {
                let mut typs = args.iter().map(Expr::typ);
                let first = match typs.next() {
                    Some(typ) => typ,
                    None => bail!("`{}` expects at least one argument", self),
                };
                if !first.is_arith() {
                    bail!(
                        "`{}`'s arguments must have an arithmetic type, unexpected type `{}`",
                        self,
                        first,
                    )
                }
                for typ in typs {
                    if typ != first {
                        bail!(
                            "`{}`'s arguments must all have the same type, found `{}` and `{}`",
                            self,
                            first,
                            typ,
                        )
                    }
                }
                if (self == Self::IDiv || self == Self::Mod) && first != Typ::Int {
                    bail!(
                        "`{}` can only be applied to integer arguments, found `{}`",
                        self,
                        first,
                    )
                }

                if self == Self::Div {
                    Typ::Rat
                } else if self == Self::Mod {
                    Typ::Int
                } else if self.is_arith_relation() {
                    Typ::Bool
                } else {
                    first
                }
            }

            Self::Eq => {
                let mut typs = args.iter().map(Expr::typ);
                let first = match typs.next() {
                    Some(typ) => typ,
                    None => bail!("`{}` expects at least one argument", self),
                };
                for typ in typs {
                    if typ != first {
                        bail!(
                            "`{}`'s arguments must all have the same type, found `{}` and `{}`",
                            self,
                            first,
                            typ,
                        )
                    }
                }
                Typ::Bool
            }
        };

        Ok(typ)
    }
}
impl Expr2Smt<()> for Op {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(
            w,
            "{}",
            match self {
                Self::Ite => "ite",
                Self::Implies => "=>",
                Self::Add => "+",
                Self::Sub => "-",
                Self::Mul => "*",
                Self::Div => "/",
                Self::IDiv => "div",
                Self::Mod => "mod",
                Self::Ge => ">=",
                Self::Le => "<=",
                Self::Gt => ">",
                Self::Lt => "<",
                Self::Eq => "=",
                Self::Not => "not",
                Self::And => "and",
                Self::Or => "or",
            }
        )?;
        Ok(())
    }
}

/// Trait implemented by everything that has a type.
pub trait HasTyp: fmt::Display {
    /// Type accessor.
    fn typ(&self) -> Typ;
}

/// A typed variable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Var {
    /// Variable identifier.
    id: String,
    /// Type of the variable.
    typ: Typ,
}
impl Var {
    /// Constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::expr::{Var, Typ};
    /// let var = Var::new("v_1", Typ::Bool);
    /// assert_eq!(var.id(), "v_1");
    /// ```
    pub fn new<S: Into<String>>(id: S, typ: Typ) -> Self {
        Self { id: id.into(), typ }
    }

    /// Identifier accessor.
    pub fn id(&self) -> &str {
        &self.id
    }
}
impl HasTyp for Var {
    fn typ(&self) -> Typ {
        self.typ
    }
}
impl Sym2Smt<()> for Var {
    fn sym_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        write!(w, "{}", self.id)?;
        Ok(())
    }
}

/// The expression structure.
///
/// An `ite` application is a *conditional*: the decomposer branches on its test. A [`Call`] is a
/// function application that the decomposer either inlines (analyzable, non-basis definitions) or
/// keeps as an opaque atomic term.
///
/// [`Call`]: #variant.Call
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Expr {
    /// A constant.
    Cst(Cst),
    /// A variable.
    Var(Var),
    /// An operator application.
    App {
        /// The operator.
        op: Op,
        /// The arguments.
        args: Vec<Expr>,
    },
    /// A function application.
    Call {
        /// Name of the function applied.
        fun: String,
        /// The arguments.
        args: Vec<Expr>,
        /// Type of the value produced by the call.
        typ: Typ,
    },
}
impl Expr {
    /// Variable constructor.
    pub fn new_var(var: Var) -> Self {
        Self::Var(var)
    }

    /// Constant constructor.
    pub fn new_cst(cst: Cst) -> Self {
        Self::Cst(cst)
    }

    /// Function application constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::{expr, expr::Typ};
    /// let call = expr::Expr::new_call("f", vec![expr::build!((x: int))], Typ::Int);
    /// assert_eq!(&call.to_string(), "(f x)");
    /// ```
    pub fn new_call<S: Into<String>>(fun: S, args: Vec<Self>, typ: Typ) -> Self {
        Self::Call {
            fun: fun.into(),
            args,
            typ,
        }
    }

    /// Operator application constructor, type-checks the application.
    pub fn new_op(op: Op, args: Vec<Self>) -> Res<Self> {
        op.type_check(&args)?;
        Ok(Self::simplify_app(op, args))
    }

    /// Simplifies the application of `op` to `args`, **non-recursively**.
    fn simplify_app(op: Op, args: Vec<Self>) -> Self {
        match (op, args.len()) {
            (Op::Sub, 1) if args[0].is_cst() => match &args[0] {
                Self::Cst(Cst::I(i)) => Cst::I(-i).into(),
                Self::Cst(Cst::R(r)) => Cst::R(-r).into(),
                _ => Self::App { op, args },
            },
            _ => Self::App { op, args },
        }
    }

    /// True if `self` is a constant.
    pub fn is_cst(&self) -> bool {
        matches!(self, Self::Cst(_))
    }
    /// True if `self` is a variable.
    pub fn is_var(&self) -> bool {
        matches!(self, Self::Var(_))
    }
    /// True if `self` is an operator application.
    pub fn is_app(&self) -> bool {
        matches!(self, Self::App { .. })
    }
    /// True if `self` is a function application.
    pub fn is_call(&self) -> bool {
        matches!(self, Self::Call { .. })
    }

    /// Normalizing negation.
    ///
    /// Binary arithmetic comparisons are flipped (`x > 0` becomes `x <= 0`), double negations are
    /// stripped, boolean constants are complemented, and everything else is wrapped in `not`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::expr;
    /// let expr = expr::build!((> (x: int) 0));
    /// assert_eq!(expr.negated(), expr::build!((<= (x: int) 0)));
    /// assert_eq!(expr.negated().negated(), expr);
    /// ```
    pub fn negated(&self) -> Self {
        match self {
            Self::Cst(Cst::B(b)) => Cst::B(!b).into(),
            Self::App { op: Op::Not, args } if args.len() == 1 => args[0].clone(),
            Self::App { op, args } if args.len() == 2 => {
                let flipped = match op {
                    Op::Gt => Some(Op::Le),
                    Op::Ge => Some(Op::Lt),
                    Op::Lt => Some(Op::Ge),
                    Op::Le => Some(Op::Gt),
                    _ => None,
                };
                match flipped {
                    Some(op) => Self::App {
                        op,
                        args: args.clone(),
                    },
                    None => Self::App {
                        op: Op::Not,
                        args: vec![self.clone()],
                    },
                }
            }
            _ => Self::App {
                op: Op::Not,
                args: vec![self.clone()],
            },
        }
    }

    /// True if `self` and `other` are syntactic complements of each other.
    pub fn complements(&self, other: &Self) -> bool {
        self.negated() == *other || other.negated() == *self
    }

    /// Substitutes variables by identifier.
    ///
    /// Variables that do not appear in `map` are left untouched.
    pub fn subst(&self, map: &Map<String, Expr>) -> Self {
        match self {
            Self::Cst(_) => self.clone(),
            Self::Var(var) => map.get(var.id()).cloned().unwrap_or_else(|| self.clone()),
            Self::App { op, args } => Self::App {
                op: *op,
                args: args.iter().map(|arg| arg.subst(map)).collect(),
            },
            Self::Call { fun, args, typ } => Self::Call {
                fun: fun.clone(),
                args: args.iter().map(|arg| arg.subst(map)).collect(),
                typ: *typ,
            },
        }
    }

    /// True if `self` contains a call to `fun`, however deep.
    pub fn mentions_call(&self, fun: &str) -> bool {
        match self {
            Self::Cst(_) | Self::Var(_) => false,
            Self::App { args, .. } => args.iter().any(|arg| arg.mentions_call(fun)),
            Self::Call { fun: f, args, .. } => {
                f == fun || args.iter().any(|arg| arg.mentions_call(fun))
            }
        }
    }

    /// Collects the free variables and the function applications of `self`.
    ///
    /// Function entries map a name to the argument types and the result type of the application.
    pub fn collect_syms(
        &self,
        vars: &mut Map<String, Typ>,
        funs: &mut Map<String, (Vec<Typ>, Typ)>,
    ) {
        match self {
            Self::Cst(_) => (),
            Self::Var(var) => {
                vars.insert(var.id().into(), var.typ());
            }
            Self::App { args, .. } => {
                for arg in args {
                    arg.collect_syms(vars, funs)
                }
            }
            Self::Call { fun, args, typ } => {
                let arg_typs = args.iter().map(Expr::typ).collect();
                funs.insert(fun.clone(), (arg_typs, *typ));
                for arg in args {
                    arg.collect_syms(vars, funs)
                }
            }
        }
    }

    /// Best-effort ground evaluation.
    ///
    /// Produces a constant when `self` contains enough constant information to decide its value:
    /// boolean structure with absorbing elements, integer arithmetic, and arithmetic relations
    /// over constants. Anything involving free variables or opaque calls is `None`, as are
    /// rational arithmetic and divisions by zero.
    pub fn eval(&self) -> Option<Cst> {
        match self {
            Self::Cst(cst) => Some(cst.clone()),
            Self::Var(_) | Self::Call { .. } => None,
            Self::App { op, args } => Self::eval_app(*op, args),
        }
    }

    fn eval_app(op: Op, args: &[Expr]) -> Option<Cst> {
        match op {
            Op::Ite => {
                if args.len() != 3 {
                    return None;
                }
                match args[0].eval()? {
                    Cst::B(true) => args[1].eval(),
                    Cst::B(false) => args[2].eval(),
                    _ => None,
                }
            }
            Op::Not => {
                if args.len() != 1 {
                    return None;
                }
                match args[0].eval()? {
                    Cst::B(b) => Some(Cst::B(!b)),
                    _ => None,
                }
            }
            Op::And | Op::Or => {
                // One absorbing argument decides the value even if others are unknown.
                let absorbing = op == Op::Or;
                let mut all_known = true;
                for arg in args {
                    match arg.eval() {
                        Some(Cst::B(b)) if b == absorbing => return Some(Cst::B(absorbing)),
                        Some(Cst::B(_)) => (),
                        _ => all_known = false,
                    }
                }
                if all_known && !args.is_empty() {
                    Some(Cst::B(!absorbing))
                } else {
                    None
                }
            }
            Op::Implies => {
                // Right-associative chain, false iff all antecedents hold and the final
                // consequent does not.
                let (last, front) = args.split_last()?;
                let mut front_known_true = true;
                for arg in front {
                    match arg.eval() {
                        Some(Cst::B(false)) => return Some(Cst::B(true)),
                        Some(Cst::B(true)) => (),
                        _ => front_known_true = false,
                    }
                }
                match last.eval() {
                    Some(Cst::B(true)) => Some(Cst::B(true)),
                    Some(Cst::B(false)) if front_known_true => Some(Cst::B(false)),
                    _ => None,
                }
            }
            Op::Eq => {
                let vals: Vec<Option<Cst>> = args.iter().map(Expr::eval).collect();
                let known: Vec<&Cst> = vals.iter().flatten().collect();
                if known.windows(2).any(|pair| pair[0] != pair[1]) {
                    return Some(Cst::B(false));
                }
                if vals.iter().all(Option::is_some) && !vals.is_empty() {
                    Some(Cst::B(true))
                } else {
                    None
                }
            }
            Op::Ge | Op::Le | Op::Gt | Op::Lt => Self::eval_cmp_chain(op, args),
            Op::Add | Op::Sub | Op::Mul => Self::eval_int_arith(op, args),
            Op::Div | Op::IDiv | Op::Mod => {
                if args.len() != 2 {
                    return None;
                }
                let (lft, rgt) = match (args[0].eval()?, args[1].eval()?) {
                    (Cst::I(lft), Cst::I(rgt)) => (lft, rgt),
                    _ => return None,
                };
                if rgt == Int::from(0) {
                    return None;
                }
                match op {
                    Op::Div => Some(Cst::R(Rat::new(lft, rgt))),
                    Op::IDiv => Some(Cst::I(lft / rgt)),
                    Op::Mod => Some(Cst::I(lft % rgt)),
                    _ => None,
                }
            }
        }
    }

    fn eval_cmp_chain(op: Op, args: &[Expr]) -> Option<Cst> {
        if args.len() < 2 {
            return None;
        }
        let mut prev: Option<Cst> = None;
        for arg in args {
            let val = arg.eval()?;
            if let Some(prev) = prev {
                let ord = match (&prev, &val) {
                    (Cst::I(lft), Cst::I(rgt)) => lft.cmp(rgt),
                    (Cst::R(lft), Cst::R(rgt)) => lft.cmp(rgt),
                    _ => return None,
                };
                let holds = match op {
                    Op::Ge => ord != std::cmp::Ordering::Less,
                    Op::Le => ord != std::cmp::Ordering::Greater,
                    Op::Gt => ord == std::cmp::Ordering::Greater,
                    Op::Lt => ord == std::cmp::Ordering::Less,
                    _ => return None,
                };
                if !holds {
                    return Some(Cst::B(false));
                }
            }
            prev = Some(val)
        }
        Some(Cst::B(true))
    }

    fn eval_int_arith(op: Op, args: &[Expr]) -> Option<Cst> {
        let mut vals = Vec::with_capacity(args.len());
        for arg in args {
            match arg.eval()? {
                Cst::I(i) => vals.push(i),
                _ => return None,
            }
        }
        let (first, rest) = vals.split_first()?;
        let mut acc = first.clone();
        if rest.is_empty() {
            return match op {
                Op::Sub => Some(Cst::I(-acc)),
                Op::Add | Op::Mul => Some(Cst::I(acc)),
                _ => None,
            };
        }
        for val in rest {
            match op {
                Op::Add => acc += val,
                Op::Sub => acc -= val,
                Op::Mul => acc *= val,
                _ => return None,
            }
        }
        Some(Cst::I(acc))
    }
}
impl HasTyp for Expr {
    fn typ(&self) -> Typ {
        match self {
            Self::Var(var) => var.typ(),
            Self::Cst(cst) => cst.typ(),
            Self::Call { typ, .. } => *typ,
            Self::App { op, args } => match op.type_check(args) {
                Ok(typ) => typ,
                Err(e) => panic!("illegal operator application `{}`: {}", self, e),
            },
        }
    }
}
impl Expr2Smt<()> for Expr {
    fn expr_to_smt2<W: Write>(&self, w: &mut W, _: ()) -> SmtRes<()> {
        match self {
            Self::Cst(cst) => cst.expr_to_smt2(w, ()),
            Self::Var(var) => var.sym_to_smt2(w, ()),
            Self::App { op, args } => {
                write!(w, "(")?;
                op.expr_to_smt2(w, ())?;
                for arg in args {
                    write!(w, " ")?;
                    arg.expr_to_smt2(w, ())?
                }
                write!(w, ")")?;
                Ok(())
            }
            Self::Call { fun, args, .. } => {
                if args.is_empty() {
                    write!(w, "{}", fun)?;
                } else {
                    write!(w, "({}", fun)?;
                    for arg in args {
                        write!(w, " ")?;
                        arg.expr_to_smt2(w, ())?
                    }
                    write!(w, ")")?;
                }
                Ok(())
            }
        }
    }
}

/// Packs basic trait implementations.
mod trait_impls {
    use super::*;

    impl fmt::Display for Typ {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Bool => write!(fmt, "bool"),
                Self::Int => write!(fmt, "int"),
                Self::Rat => write!(fmt, "rat"),
            }
        }
    }

    impl fmt::Display for Op {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Ite => write!(fmt, "ite"),
                Self::Implies => write!(fmt, "=>"),
                Self::Add => write!(fmt, "+"),
                Self::Sub => write!(fmt, "-"),
                Self::Mul => write!(fmt, "*"),
                Self::Div => write!(fmt, "/"),
                Self::IDiv => write!(fmt, "div"),
                Self::Mod => write!(fmt, "%"),
                Self::Ge => write!(fmt, ">="),
                Self::Le => write!(fmt, "<="),
                Self::Gt => write!(fmt, ">"),
                Self::Lt => write!(fmt, "<"),
                Self::Eq => write!(fmt, "="),
                Self::Not => write!(fmt, "not"),
                Self::And => write!(fmt, "and"),
                Self::Or => write!(fmt, "or"),
            }
        }
    }

    impl fmt::Display for Cst {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::B(b) => b.fmt(fmt),
                Self::I(i) => {
                    if i.sign() == Sign::Minus {
                        write!(fmt, "(- {})", -i)
                    } else {
                        i.fmt(fmt)
                    }
                }
                Self::R(r) => {
                    let (num, den) = (r.numer(), r.denom());
                    match (num.sign(), den.sign()) {
                        (Sign::Minus, Sign::Minus) => write!(fmt, "(/ {} {})", -num, -den),
                        (Sign::Minus, _) => write!(fmt, "(- (/ {} {}))", -num, den),
                        (_, Sign::Minus) => write!(fmt, "(- (/ {} {}))", num, -den),
                        _ => write!(fmt, "(/ {} {})", num, den),
                    }
                }
            }
        }
    }
    impl From<bool> for Cst {
        fn from(b: bool) -> Self {
            Self::B(b)
        }
    }
    impl From<Int> for Cst {
        fn from(i: Int) -> Self {
            Self::I(i)
        }
    }
    impl From<usize> for Cst {
        fn from(n: usize) -> Self {
            Int::from_bytes_be(Sign::Plus, &n.to_be_bytes()).into()
        }
    }
    impl From<(usize, usize)> for Cst {
        fn from((num, den): (usize, usize)) -> Self {
            let (num, den): (Int, Int) = (num.into(), den.into());
            Rat::new(num, den).into()
        }
    }
    impl From<Rat> for Cst {
        fn from(r: Rat) -> Self {
            Self::R(r)
        }
    }

    impl fmt::Display for Var {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            write!(fmt, "{}", self.id)
        }
    }

    impl fmt::Display for Expr {
        fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
            match self {
                Self::Cst(cst) => cst.fmt(fmt),
                Self::Var(var) => var.fmt(fmt),
                Self::App { op, args } => {
                    write!(fmt, "({}", op)?;
                    for arg in args {
                        write!(fmt, " {}", arg)?
                    }
                    write!(fmt, ")")
                }
                Self::Call { fun, args, .. } => {
                    if args.is_empty() {
                        write!(fmt, "{}", fun)
                    } else {
                        write!(fmt, "({}", fun)?;
                        for arg in args {
                            write!(fmt, " {}", arg)?
                        }
                        write!(fmt, ")")
                    }
                }
            }
        }
    }
    impl<C> From<C> for Expr
    where
        C: Into<Cst>,
    {
        fn from(cst: C) -> Self {
            Self::Cst(cst.into())
        }
    }
    impl From<(Op, Vec<Expr>)> for Expr {
        fn from((op, args): (Op, Vec<Expr>)) -> Self {
            Self::App { op, args }
        }
    }
}
