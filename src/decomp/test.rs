//! Tests over region decomposition.

crate::prelude!();

use decomp::{Decomp, Options, Region};
use expr::{Typ, Var};
use fun::{Def, Defs, Sig};
use oracle::{Feasibility, Oracle, SynOracle};

fn int_sig(ids: &[&str]) -> Sig {
    Sig::new(ids.iter().map(|id| Var::new(*id, Typ::Int)).collect())
}

fn decompose(defs: &Defs, target: &str, opts: Options) -> Vec<Region> {
    Decomp::new(defs, target, opts, SynOracle::new())
        .unwrap()
        .decompose()
        .unwrap()
}

/// `f(x) = if x > 0 { 1 } else { -1 }`.
fn sign_defs() -> Defs {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((ite (> (x: int) 0) 1 (- 1))),
    ));
    defs
}

#[test]
fn sign_split() {
    let regions = decompose(&sign_defs(), "f", Options::new());

    assert_eq!(regions.len(), 2);

    // then-branch first
    assert_eq!(regions[0].path(), &[build_expr!((> (x: int) 0))][..]);
    assert_eq!(regions[0].invariant(), &build_expr!(1));
    assert_eq!(regions[1].path(), &[build_expr!((<= (x: int) 0))][..]);
    assert_eq!(regions[1].invariant(), &build_expr!((- 1)));

    // the two path conditions partition the domain
    assert!(regions[0].path()[0].complements(&regions[1].path()[0]));

    // no feasibility check requested, nothing was decided
    for region in &regions {
        assert_eq!(region.feasibility(), Feasibility::Unknown);
    }
}

#[test]
fn undecided_regions_are_kept() {
    let mut opts = Options::new();
    opts.prune = true;
    let regions = decompose(&sign_defs(), "f", opts);

    // neither path is syntactically decidable, both survive as unknown
    assert_eq!(regions.len(), 2);
    for region in &regions {
        assert_eq!(region.feasibility(), Feasibility::Unknown);
    }
}

#[test]
fn prune_ground_branch() {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((ite (> 1 2) 1 2)),
    ));
    let mut opts = Options::new();
    opts.prune = true;
    let regions = decompose(&defs, "f", opts);

    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].path(), &[build_expr!((<= 1 2))][..]);
    assert_eq!(regions[0].invariant(), &build_expr!(2));
    assert_eq!(regions[0].feasibility(), Feasibility::Feasible);
}

/// `f(x, y) = if x > 10 || y < 20 { 1 } else { 2 }`.
fn or_defs() -> Defs {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "f",
        int_sig(&["x", "y"]),
        Typ::Int,
        build_expr!((ite (or (> (x: int) 10) (< (y: int) 20)) 1 2)),
    ));
    defs
}

#[test]
fn or_test_splits_per_decision() {
    let regions = decompose(&or_defs(), "f", Options::new());

    // one region per path through the disjunction, short-circuit order
    assert_eq!(regions.len(), 3);
    assert_eq!(regions[0].path(), &[build_expr!((> (x: int) 10))][..]);
    assert_eq!(regions[0].invariant(), &build_expr!(1));
    assert_eq!(
        regions[1].path(),
        &[build_expr!((<= (x: int) 10)), build_expr!((< (y: int) 20))][..],
    );
    assert_eq!(regions[1].invariant(), &build_expr!(1));
    assert_eq!(
        regions[2].path(),
        &[build_expr!((<= (x: int) 10)), build_expr!((>= (y: int) 20))][..],
    );
    assert_eq!(regions[2].invariant(), &build_expr!(2));
}

#[test]
fn or_test_compound() {
    let mut opts = Options::new();
    opts.compound = true;
    let regions = decompose(&or_defs(), "f", opts);

    // the two `1` regions collapse into the first slot, disjunctively
    assert_eq!(regions.len(), 2);
    assert_eq!(
        regions[0].path(),
        &[build_expr!(
            (or (> (x: int) 10) (and (<= (x: int) 10) (< (y: int) 20)))
        )][..],
    );
    assert_eq!(regions[0].invariant(), &build_expr!(1));
    assert_eq!(
        regions[1].path(),
        &[build_expr!((<= (x: int) 10)), build_expr!((>= (y: int) 20))][..],
    );
    assert_eq!(regions[1].invariant(), &build_expr!(2));
}

#[test]
fn reduce_symmetry_collapses_to_true_path() {
    // f(x, y) = if x + y = 10 { 1 } else if x > y { 1 } else { 2 }
    let mut defs = Defs::new();
    defs.register(Def::new(
        "f",
        int_sig(&["x", "y"]),
        Typ::Int,
        build_expr!(
            (ite (= (+ (x: int) (y: int)) 10)
                1
                (ite (> (x: int) (y: int)) 1 2)
            )
        ),
    ));
    // side-condition parameters are matched positionally, names differ on purpose
    let side = Def::new(
        "ordered",
        int_sig(&["a", "b"]),
        Typ::Bool,
        build_expr!((> (a: int) (b: int))),
    );

    let mut opts = Options::new();
    opts.assuming = Some(side);
    opts.reduce_symmetry = true;
    let regions = decompose(&defs, "f", opts);

    // the `2` region contradicts the side-condition and is dropped; the two `1` regions merge,
    // the side-entailed `x > y` constraint goes, and the leftover complementary pair covers
    // everything
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].path(), &[][..]);
    assert_eq!(regions[0].invariant(), &build_expr!(1));
}

/// Oracle whose heavyweight check refutes everything its plain check cannot decide.
struct FullRefuter;
impl Oracle for FullRefuter {
    fn is_satisfiable(&mut self, constraints: &[expr::Expr]) -> Res<Feasibility> {
        SynOracle::new().is_satisfiable(constraints)
    }
    fn is_satisfiable_full(&mut self, constraints: &[expr::Expr]) -> Res<Feasibility> {
        match SynOracle::new().is_satisfiable(constraints)? {
            Feasibility::Unknown => Ok(Feasibility::Infeasible),
            verdict => Ok(verdict),
        }
    }
    fn evaluate_equal_under(
        &mut self,
        _side: &expr::Expr,
        lft: &expr::Expr,
        rgt: &expr::Expr,
    ) -> Res<bool> {
        Ok(lft == rgt)
    }
}

#[test]
fn aggressive_rec_uses_the_heavyweight_check() {
    let defs = sign_defs();

    // the plain check cannot decide either path
    let mut opts = Options::new();
    opts.prune = true;
    let regions = Decomp::new(&defs, "f", opts, FullRefuter)
        .unwrap()
        .decompose()
        .unwrap();
    assert_eq!(regions.len(), 2);

    // the heavyweight check refutes both
    let mut opts = Options::new();
    opts.aggressive_rec = true;
    let regions = Decomp::new(&defs, "f", opts, FullRefuter)
        .unwrap()
        .decompose()
        .unwrap();
    assert!(regions.is_empty());
}

#[test]
fn side_condition_prunes_contradicted_regions() {
    let side = Def::new(
        "positive",
        int_sig(&["a"]),
        Typ::Bool,
        build_expr!((> (a: int) 0)),
    );
    let mut opts = Options::new();
    opts.assuming = Some(side);
    let regions = decompose(&sign_defs(), "f", opts);

    // `x <= 0` contradicts the side-condition syntactically
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].invariant(), &build_expr!(1));
}

/// `g(a) = if a >= 0 { a } else { 0 - a }`, `f(x) = if g(x) > 5 { 1 } else { 2 }`.
fn helper_defs() -> Defs {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "g",
        int_sig(&["a"]),
        Typ::Int,
        build_expr!((ite (>= (a: int) 0) (a: int) (- 0 (a: int)))),
    ));
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((ite (> (call g: int (x: int)) 5) 1 2)),
    ));
    defs
}

#[test]
fn helper_is_inlined() {
    let regions = decompose(&helper_defs(), "f", Options::new());

    // `g`'s conditional is hoisted to decision level, its branching shows up in the paths
    assert_eq!(regions.len(), 4);
    assert_eq!(
        regions[0].path(),
        &[build_expr!((>= (x: int) 0)), build_expr!((> (x: int) 5))][..],
    );
    assert_eq!(regions[0].invariant(), &build_expr!(1));
    assert_eq!(
        regions[1].path(),
        &[build_expr!((>= (x: int) 0)), build_expr!((<= (x: int) 5))][..],
    );
    assert_eq!(regions[1].invariant(), &build_expr!(2));
    assert_eq!(
        regions[2].path(),
        &[
            build_expr!((< (x: int) 0)),
            build_expr!((> (- 0 (x: int)) 5)),
        ][..],
    );
    assert_eq!(regions[2].invariant(), &build_expr!(1));
    assert_eq!(regions[3].invariant(), &build_expr!(2));

    for region in &regions {
        for constraint in region.path() {
            assert!(!constraint.mentions_call("g"));
        }
    }
}

#[test]
fn basis_keeps_calls_atomic() {
    let mut opts = Options::new();
    opts.basis.insert("g".to_string());
    let regions = decompose(&helper_defs(), "f", opts);

    assert_eq!(regions.len(), 2);
    assert_eq!(
        regions[0].path(),
        &[build_expr!((> (call g: int (x: int)) 5))][..],
    );
    assert_eq!(
        regions[1].path(),
        &[build_expr!((<= (call g: int (x: int)) 5))][..],
    );
    for region in &regions {
        assert!(region.path()[0].mentions_call("g"));
    }
}

/// `never(a) = a > 0 && a <= 0`, `f(x) = if never(x) { 1 } else { 2 }`.
fn never_defs() -> Defs {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "never",
        int_sig(&["a"]),
        Typ::Bool,
        build_expr!((and (> (a: int) 0) (<= (a: int) 0))),
    ));
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((ite (call never: bool (x: int)) 1 2)),
    ));
    defs
}

#[test]
fn interpret_basis_feeds_definitions_to_the_oracle() {
    let mut opts = Options::new();
    opts.basis.insert("never".to_string());
    opts.prune = true;

    // atomic calls alone, nothing is decidable
    let regions = decompose(&never_defs(), "f", opts.clone());
    assert_eq!(regions.len(), 2);

    // interpreting the basis exposes the contradiction in `never`'s body
    opts.interpret_basis = true;
    let regions = decompose(&never_defs(), "f", opts);
    assert_eq!(regions.len(), 1);
    assert_eq!(
        regions[0].path(),
        &[build_expr!((not (call never: bool (x: int))))][..],
    );
    assert_eq!(regions[0].invariant(), &build_expr!(2));
}

/// `fact(n) = if n <= 1 { 1 } else { n * fact(n - 1) }`.
fn fact_defs() -> Defs {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "fact",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!(
            (ite (<= (n: int) 1)
                1
                (* (n: int) (call fact: int (- (n: int) 1)))
            )
        ),
    ));
    defs
}

#[test]
fn guarded_recursion_stays_atomic() {
    let regions = decompose(&fact_defs(), "fact", Options::new());

    assert_eq!(regions.len(), 2);
    assert_eq!(regions[0].path(), &[build_expr!((<= (n: int) 1))][..]);
    assert_eq!(regions[0].invariant(), &build_expr!(1));
    assert_eq!(regions[1].path(), &[build_expr!((> (n: int) 1))][..]);
    // the recursive call shows up, unexpanded, in the invariant
    assert!(regions[1].invariant().mentions_call("fact"));
}

#[test]
fn unguarded_recursion_is_rejected() {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "spin",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!((+ (call spin: int (n: int)) 1)),
    ));

    match Decomp::new(&defs, "spin", Options::new(), SynOracle::new()) {
        Err(e) => match e.kind() {
            ErrorKind::MalformedFunction(_) => (),
            kind => panic!("expected malformed-function error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on unguarded recursion"),
    }
}

#[test]
fn unguarded_recursion_in_basis_is_accepted() {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "spin",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!((+ (call spin: int (n: int)) 1)),
    ));
    let mut opts = Options::new();
    opts.basis.insert("spin".to_string());

    assert!(Decomp::new(&defs, "spin", opts, SynOracle::new()).is_ok());
}

#[test]
fn mutual_recursion_cycle_is_rejected() {
    let mut defs = Defs::new();
    defs.register(Def::new(
        "p",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!((call q: int (n: int))),
    ));
    defs.register(Def::new(
        "q",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!((call p: int (n: int))),
    ));
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((call p: int (x: int))),
    ));

    let mut decomp = Decomp::new(&defs, "f", Options::new(), SynOracle::new()).unwrap();
    match decomp.decompose() {
        Err(e) => match e.kind() {
            ErrorKind::MalformedFunction(_) => (),
            kind => panic!("expected malformed-function error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on a mutual-recursion cycle"),
    }
}

#[test]
fn opaque_target_is_rejected() {
    let mut defs = Defs::new();
    defs.register(Def::new_opaque(
        "read",
        int_sig(&["n"]),
        Typ::Int,
        build_expr!((n: int)),
    ));

    match Decomp::new(&defs, "read", Options::new(), SynOracle::new()) {
        Err(e) => match e.kind() {
            ErrorKind::MalformedFunction(_) => (),
            kind => panic!("expected malformed-function error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on an opaque target"),
    }
}

#[test]
fn unknown_target_is_rejected() {
    let defs = Defs::new();
    match Decomp::new(&defs, "nope", Options::new(), SynOracle::new()) {
        Err(e) => assert_eq!(e.to_string(), "unknown function `nope`"),
        Ok(_) => panic!("expected an error on an unknown target"),
    }
}

#[test]
fn mismatched_side_condition_is_rejected() {
    let side = Def::new(
        "narrow",
        int_sig(&["a", "b"]),
        Typ::Bool,
        build_expr!((> (a: int) (b: int))),
    );
    let mut opts = Options::new();
    opts.assuming = Some(side);

    match Decomp::new(&sign_defs(), "f", opts, SynOracle::new()) {
        Err(e) => match e.kind() {
            ErrorKind::InvalidSideCondition(_) => (),
            kind => panic!("expected invalid-side-condition error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on a signature mismatch"),
    }
}

#[test]
fn non_bool_side_condition_is_rejected() {
    let side = Def::new("weight", int_sig(&["a"]), Typ::Int, build_expr!((a: int)));
    let mut opts = Options::new();
    opts.assuming = Some(side);

    match Decomp::new(&sign_defs(), "f", opts, SynOracle::new()) {
        Err(e) => match e.kind() {
            ErrorKind::InvalidSideCondition(_) => (),
            kind => panic!("expected invalid-side-condition error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on a non-bool side-condition"),
    }
}

#[test]
fn recursive_interpreted_basis_is_rejected() {
    let mut defs = fact_defs();
    defs.register(Def::new(
        "f",
        int_sig(&["x"]),
        Typ::Int,
        build_expr!((call fact: int (x: int))),
    ));
    let mut opts = Options::new();
    opts.basis.insert("fact".to_string());
    opts.interpret_basis = true;

    match Decomp::new(&defs, "f", opts, SynOracle::new()) {
        Err(e) => match e.kind() {
            ErrorKind::MalformedFunction(_) => (),
            kind => panic!("expected malformed-function error, got {}", kind),
        },
        Ok(_) => panic!("expected an error on a recursive interpreted basis"),
    }
}

#[test]
fn refine_with_nothing_is_identity() {
    let defs = sign_defs();
    let mut decomp = Decomp::new(&defs, "f", Options::new(), SynOracle::new()).unwrap();
    let regions = decomp.decompose().unwrap();

    let refined = decomp.refine(&regions[0], vec![]).unwrap();
    assert_eq!(refined, Some(regions[0].clone()));
}

#[test]
fn refine_narrows_and_drops_contradictions() {
    let defs = sign_defs();
    let mut decomp = Decomp::new(&defs, "f", Options::new(), SynOracle::new()).unwrap();
    let regions = decomp.decompose().unwrap();

    // narrowing `x > 0` with `x > 10` keeps the region, undecided
    let narrowed = decomp
        .refine(&regions[0], vec![build_expr!((> (x: int) 10))])
        .unwrap()
        .unwrap();
    assert_eq!(
        narrowed.path(),
        &[build_expr!((> (x: int) 0)), build_expr!((> (x: int) 10))][..],
    );
    assert_eq!(narrowed.invariant(), regions[0].invariant());
    assert_eq!(narrowed.feasibility(), Feasibility::Unknown);
    // the input region is untouched
    assert_eq!(regions[0].path().len(), 1);

    // a contradictory extra constraint kills the region
    let dead = decomp
        .refine(&regions[0], vec![build_expr!((<= (x: int) 0))])
        .unwrap();
    assert_eq!(dead, None);
}
