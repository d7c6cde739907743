//! Crate-level macros.

/// Imports the crate's prelude.
#[macro_export]
macro_rules! prelude {
    {} => { use $crate::prelude::*; };
    { pub } => { pub use $crate::prelude::*; };
}

/// Convenience macro, provides a DSL for writing expressions.
///
/// - variables must be written as `(var_name: var_typ)`, without any quotes;
/// - function calls must be written as `(call fun_name: result_typ arg_1 arg_2 ...)`, where the
///   result type is the type of the value the call produces.
#[macro_export]
macro_rules! build_expr {
    (true) => ( $crate::expr::Expr::from(true) );
    (false) => ( $crate::expr::Expr::from(false) );

    ( (call $fun:ident : $typ:ident $($args:tt)*) ) => (
        $crate::expr::Expr::new_call(
            stringify!($fun),
            vec![ $($crate::build_expr!($args)),* ],
            $crate::build_typ!($typ),
        )
    );

    ( ($var:ident : $typ:ident) ) => (
        $crate::expr::Expr::new_var(
            $crate::expr::Var::new(stringify!($var), $crate::build_typ!($typ))
        )
    );

    ( ($op:tt $($args:tt)*) ) => (
        $crate::expr::Expr::from((
            $crate::build_expr!(@op $op),
            vec![ $($crate::build_expr!($args)),* ],
        ))
    );

    ($cst:expr) => ( $crate::expr::Expr::from($cst) );

    (@op ite) => ( $crate::expr::Op::Ite );
    (@op +) => ( $crate::expr::Op::Add );
    (@op -) => ( $crate::expr::Op::Sub );
    (@op *) => ( $crate::expr::Op::Mul );
    (@op /) => ( $crate::expr::Op::Div );
    (@op %) => ( $crate::expr::Op::Mod );
    (@op >=) => ( $crate::expr::Op::Ge );
    (@op <=) => ( $crate::expr::Op::Le );
    (@op >) => ( $crate::expr::Op::Gt );
    (@op <) => ( $crate::expr::Op::Lt );
    (@op =) => ( $crate::expr::Op::Eq );
    (@op not) => ( $crate::expr::Op::Not );
    (@op and) => ( $crate::expr::Op::And );
    (@op or) => ( $crate::expr::Op::Or );
    (@op implies) => ( $crate::expr::Op::Implies );
    (@op !) => ( $crate::expr::Op::Not );
    (@op &&) => ( $crate::expr::Op::And );
    (@op ||) => ( $crate::expr::Op::Or );
}

/// Builds a type.
#[macro_export]
macro_rules! build_typ {
    (bool) => {
        $crate::expr::Typ::Bool
    };
    (int) => {
        $crate::expr::Typ::Int
    };
    (rat) => {
        $crate::expr::Typ::Rat
    };
}
