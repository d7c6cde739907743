//! Region decomposition for finite-branching decision functions.
//!
//! Given a pure function expressed as a tree of conditionals over symbolic inputs, this library
//! partitions the function's input domain into a finite covering of *regions*: each region
//! carries the branch-path constraints that reach it and the symbolic value computed along that
//! path. Feasibility of path conditions is delegated to a pluggable [`oracle::Oracle`]; a
//! syntactic oracle and a Z3-backed one (through [`rsmt2`]) are provided.
//!
//! # Example
//!
//! ```rust
//! use decomp::{
//!     decomp::{Decomp, Options},
//!     expr::{self, Typ, Var},
//!     fun::{Def, Defs, Sig},
//!     oracle::SynOracle,
//! };
//!
//! // f(x, y) = if x > 10 || y < 20 { 1 } else { 2 }
//! let mut defs = Defs::new();
//! defs.register(Def::new(
//!     "f",
//!     Sig::new(vec![Var::new("x", Typ::Int), Var::new("y", Typ::Int)]),
//!     Typ::Int,
//!     expr::build!((ite (or (> (x: int) 10) (< (y: int) 20)) 1 2)),
//! ));
//!
//! let mut decomp = Decomp::new(&defs, "f", Options::new(), SynOracle::new()).unwrap();
//! let regions = decomp.decompose().unwrap();
//!
//! // one region per decision path: `x > 10`, `x <= 10 ∧ y < 20`, `x <= 10 ∧ y >= 20`
//! assert_eq!(regions.len(), 3);
//! assert_eq!(regions[0].invariant(), &expr::build!(1));
//! assert_eq!(regions[2].invariant(), &expr::build!(2));
//! ```
//!
//! [`oracle::Oracle`]: oracle/trait.Oracle.html (The Oracle trait)
//! [`rsmt2`]: https://crates.io/crates/rsmt2

#![forbid(missing_docs)]

pub extern crate rsmt2;

mod macros;

pub mod prelude;

pub mod decomp;
pub mod expr;
pub mod fun;
pub mod oracle;
