//! Function definitions and the definition registry.
//!
//! A decomposition target is a [`Def`]: a named function with a typed argument [`Sig`]nature, a
//! result type, a body expression, and an execution [`Mode`]. Definitions live in a [`Defs`]
//! registry so that calls between them can be resolved during decomposition.
//!
//! [`Def`]: struct.Def.html (The Def struct)
//! [`Sig`]: struct.Sig.html (The Sig struct)
//! [`Mode`]: enum.Mode.html (The Mode enum)
//! [`Defs`]: struct.Defs.html (The Defs struct)

crate::prelude!();

use expr::{Expr, HasTyp, Op, Typ, Var};


/// Ordered, typed argument signature of a function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sig {
    /// Parameters, in declaration order.
    params: Vec<Var>,
}
impl Sig {
    /// Constructor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::fun::Sig;
    /// # use decomp::expr::{Typ, Var};
    /// let sig = Sig::new(vec![Var::new("x", Typ::Int), Var::new("y", Typ::Int)]);
    /// assert_eq!(sig.arity(), 2);
    /// assert_eq!(&sig.to_string(), "x: int, y: int");
    /// ```
    pub fn new(params: Vec<Var>) -> Self {
        Self { params }
    }

    /// Parameter accessor.
    pub fn params(&self) -> &[Var] {
        &self.params
    }

    /// Number of parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    /// True if `self` and `other` have the same arity and the same type at every position.
    ///
    /// Parameter *names* are allowed to differ, side-conditions are matched against their target
    /// positionally.
    pub fn same_shape(&self, other: &Sig) -> bool {
        self.arity() == other.arity()
            && self
                .params
                .iter()
                .zip(other.params.iter())
                .all(|(lft, rgt)| lft.typ() == rgt.typ())
    }

    /// Substitution map binding `self`'s parameters to `args`, positionally.
    ///
    /// Fails if the number of arguments does not match the arity.
    pub fn subst_map(&self, args: &[Expr]) -> Res<Map<String, Expr>> {
        if args.len() != self.arity() {
            bail!(
                "expected {} argument(s), got {}",
                self.arity(),
                args.len()
            )
        }
        Ok(self
            .params
            .iter()
            .zip(args.iter())
            .map(|(param, arg)| (param.id().to_string(), arg.clone()))
            .collect())
    }
}
impl fmt::Display for Sig {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        for (idx, param) in self.params.iter().enumerate() {
            if idx > 0 {
                write!(fmt, ", ")?
            }
            write!(fmt, "{}: {}", param, param.typ())?
        }
        Ok(())
    }
}

/// Execution mode of a definition.
///
/// `Analyzable` definitions are pure and may be inlined during decomposition. `Opaque`
/// definitions may perform effects the decomposer cannot reason about; they are never inlined and
/// appear as atomic call terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Pure, expandable definition.
    Analyzable,
    /// Effectful or otherwise unanalyzable definition, always atomic.
    Opaque,
}

/// A named function definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Def {
    /// Name of the function.
    name: String,
    /// Argument signature.
    sig: Sig,
    /// Result type.
    ret: Typ,
    /// Body expression over the signature's parameters.
    body: Expr,
    /// Execution mode.
    mode: Mode,
}
impl Def {
    /// Constructor for analyzable definitions.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use decomp::{expr, fun::{Def, Sig}};
    /// # use decomp::expr::{Typ, Var};
    /// // `f(x) = if x > 0 { 1 } else { (- 1) }`
    /// let def = Def::new(
    ///     "f",
    ///     Sig::new(vec![Var::new("x", Typ::Int)]),
    ///     Typ::Int,
    ///     expr::build!((ite (> (x: int) 0) 1 (- 1))),
    /// );
    /// assert!(!def.is_recursive());
    /// ```
    pub fn new<S: Into<String>>(name: S, sig: Sig, ret: Typ, body: Expr) -> Self {
        Self {
            name: name.into(),
            sig,
            ret,
            body,
            mode: Mode::Analyzable,
        }
    }

    /// Constructor for opaque definitions.
    pub fn new_opaque<S: Into<String>>(name: S, sig: Sig, ret: Typ, body: Expr) -> Self {
        Self {
            mode: Mode::Opaque,
            ..Self::new(name, sig, ret, body)
        }
    }

    /// Name accessor.
    pub fn name(&self) -> &str {
        &self.name
    }
    /// Signature accessor.
    pub fn sig(&self) -> &Sig {
        &self.sig
    }
    /// Result type accessor.
    pub fn ret(&self) -> Typ {
        self.ret
    }
    /// Body accessor.
    pub fn body(&self) -> &Expr {
        &self.body
    }
    /// Mode accessor.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// True if the body mentions the definition's own name.
    pub fn is_recursive(&self) -> bool {
        self.body.mentions_call(&self.name)
    }

    /// True if the body contains a self-call that is not guarded by a conditional.
    ///
    /// A self-call is *guarded* when it sits strictly below the then- or else-branch of some
    /// `ite`; a guarded call can be kept as an atomic term without losing finiteness of the
    /// traversal. A self-call in a conditional's test, or on the body's spine, is unguarded.
    pub fn has_unguarded_self_call(&self) -> bool {
        Self::unguarded_self_call_in(&self.name, &self.body, false)
    }

    fn unguarded_self_call_in(name: &str, expr: &Expr, guarded: bool) -> bool {
        match expr {
            Expr::Cst(_) | Expr::Var(_) => false,
            Expr::Call { fun, args, .. } => {
                (fun == name && !guarded)
                    || args
                        .iter()
                        .any(|arg| Self::unguarded_self_call_in(name, arg, guarded))
            }
            Expr::App { op: Op::Ite, args } if args.len() == 3 => {
                Self::unguarded_self_call_in(name, &args[0], guarded)
                    || Self::unguarded_self_call_in(name, &args[1], true)
                    || Self::unguarded_self_call_in(name, &args[2], true)
            }
            Expr::App { args, .. } => args
                .iter()
                .any(|arg| Self::unguarded_self_call_in(name, arg, guarded)),
        }
    }
}
impl fmt::Display for Def {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}({}) -> {} = {}",
            self.name, self.sig, self.ret, self.body
        )
    }
}

/// A registry of function definitions.
#[derive(Debug, Clone, Default)]
pub struct Defs {
    /// Map from names to definitions.
    defs: Map<String, Def>,
}
impl Defs {
    /// Constructor.
    pub fn new() -> Self {
        Self { defs: Map::new() }
    }

    /// Registers a definition.
    ///
    /// Returns the previous definition if the name was already registered.
    pub fn register(&mut self, def: Def) -> Option<Def> {
        self.defs.insert(def.name.clone(), def)
    }

    /// Definition accessor.
    pub fn get(&self, name: &str) -> Option<&Def> {
        self.defs.get(name)
    }

    /// True if `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    /// Iterator over all definitions, ordered by name.
    pub fn iter(&self) -> impl Iterator<Item = &Def> {
        self.defs.values()
    }

    /// Number of registered definitions.
    pub fn len(&self) -> usize {
        self.defs.len()
    }
    /// True if no definition is registered.
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}
