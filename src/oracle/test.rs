//! Tests over the syntactic oracle.

crate::prelude!();

use oracle::{Feasibility, Oracle, SynOracle};

#[test]
fn empty_conjunction_is_feasible() {
    let mut oracle = SynOracle::new();
    assert_eq!(oracle.is_satisfiable(&[]).unwrap(), Feasibility::Feasible);
}

#[test]
fn ground_constraints() {
    let mut oracle = SynOracle::new();
    assert_eq!(
        oracle.is_satisfiable(&[build_expr!((> 1 2))]).unwrap(),
        Feasibility::Infeasible,
    );
    assert_eq!(
        oracle
            .is_satisfiable(&[build_expr!((<= 1 2)), build_expr!(true)])
            .unwrap(),
        Feasibility::Feasible,
    );
    // one false constraint sinks the whole conjunction
    assert_eq!(
        oracle
            .is_satisfiable(&[build_expr!((> (x: int) 0)), build_expr!(false)])
            .unwrap(),
        Feasibility::Infeasible,
    );
}

#[test]
fn complementary_pair() {
    let mut oracle = SynOracle::new();
    let constraints = [build_expr!((> (x: int) 0)), build_expr!((<= (x: int) 0))];
    assert_eq!(
        oracle.is_satisfiable(&constraints).unwrap(),
        Feasibility::Infeasible,
    );
}

#[test]
fn nested_conjunctions_are_flattened() {
    let mut oracle = SynOracle::new();
    // the complement pair hides inside an `and`
    let constraints = [
        build_expr!((>= (y: int) 7)),
        build_expr!((and (> (x: int) 0) (<= (x: int) 0))),
    ];
    assert_eq!(
        oracle.is_satisfiable(&constraints).unwrap(),
        Feasibility::Infeasible,
    );
}

#[test]
fn undecided_is_unknown() {
    let mut oracle = SynOracle::new();
    assert_eq!(
        oracle
            .is_satisfiable(&[build_expr!((> (x: int) 0))])
            .unwrap(),
        Feasibility::Unknown,
    );
    // `x < 0 ∧ x > 1` is unsat but not syntactically so
    assert_eq!(
        oracle
            .is_satisfiable(&[build_expr!((< (x: int) 0)), build_expr!((> (x: int) 1))])
            .unwrap(),
        Feasibility::Unknown,
    );
}

#[test]
fn equal_under_is_syntactic() {
    let mut oracle = SynOracle::new();
    let side = build_expr!(true);
    let lft = build_expr!((+ (x: int) 1));
    assert!(oracle.evaluate_equal_under(&side, &lft, &lft.clone()).unwrap());

    let rgt = build_expr!((+ 1 (x: int)));
    assert!(!oracle.evaluate_equal_under(&side, &lft, &rgt).unwrap());
}
