//! Common imports throughout this project.

pub use std::{
    collections::{BTreeMap as Map, BTreeSet as Set},
    fmt,
    io::Write,
    ops::{Deref, DerefMut},
};

pub use error_chain::bail;
pub use num::{bigint::Sign, BigInt as Int, BigRational as Rat};
pub use rsmt2::SmtRes;

pub use crate::{build_expr, build_typ, decomp, expr, fun, oracle};

error_chain::error_chain! {
    types {
        Error, ErrorKind, ResExt, Res;
    }

    links {
        Smt2(rsmt2::errors::Error, rsmt2::errors::ErrorKind)
        /// An error from the `rsmt2` crate.
        ;
    }

    foreign_links {
        Io(std::io::Error)
        /// I/O error.
        ;
    }

    errors {
        /// A function definition that violates the decomposer's structural requirements.
        ///
        /// Typically an unguarded self-call that is not abstracted by the basis, or a cycle
        /// through definition inlining.
        MalformedFunction(msg: String) {
            description("malformed function")
            display("malformed function: {}", msg)
        }
        /// A side-condition whose signature does not match the target function's.
        InvalidSideCondition(msg: String) {
            description("invalid side-condition")
            display("invalid side-condition: {}", msg)
        }
    }
}
