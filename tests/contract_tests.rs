//! Every strategy driven through the same cases via LinearizationEngine.


use linearize::{
    check_linearization, CyclePolicy, DuplicatePolicy, Error, LinearizationEngine, Strategy,
};
use test_data_gen::{engine_with, from_pairs, ids, linear_deps, strategies, tree_deps};

fn solve(strategy: Strategy, pairs: &[(&str, &str)]) -> linearize::Result<Vec<linearize::PhaseId>> {
    let mut e = LinearizationEngine::with_strategy(strategy);
    from_pairs(pairs).apply(&mut e)?;
    e.linearize()
}

#[test]
fn unique_orders_match_for_every_strategy() {
    let cases: &[(&[(&str, &str)], &[&str])] = &[
        (&[("a", "")], &["a"]),
        (&[("a", "b")], &["b", "a"]),
        (&[("a", "b"), ("b", "c")], &["c", "b", "a"]),
        (&[("a", "b"), ("b", "c"), ("c", "d")], &["d", "c", "b", "a"]),
        (
            &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")],
            &["d", "c", "b", "a"],
        ),
    ];
    for s in strategies() {
        for (pairs, expected) in cases {
            assert_eq!(solve(s, pairs).unwrap(), ids(expected), "{s} on {pairs:?}");
        }
    }
}

#[test]
fn cycle_reported_for_every_strategy() {
    // a -> b -> c -> a, plus a tail hanging off b
    let pairs = [("a", "b"), ("b", "c"), ("c", "a"), ("b", "d"), ("d", "e")];
    for s in strategies() {
        let err = solve(s, &pairs).unwrap_err();
        assert!(err.is_cycle(), "{s}: {err}");
        assert!(err.to_string().contains("cycle"), "{s}: {err}");
        if let Error::Cycle { phases } = err {
            for p in ["a", "b", "c"] {
                assert!(phases.iter().any(|x| x == p), "{s}: witness {phases:?} lacks {p}");
            }
        }
    }
}

#[test]
fn cycle_detected_whatever_the_insertion_order() {
    let edges = [("a", "b"), ("b", "c"), ("c", "a")];
    let perms = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
    for s in strategies() {
        for perm in perms {
            let pairs: Vec<(&str, &str)> = perm.iter().map(|&i| edges[i]).collect();
            assert!(solve(s, &pairs).unwrap_err().is_cycle(), "{s} {pairs:?}");
        }
    }
}

#[test]
fn generated_problems_are_ordered_validly() {
    for s in strategies() {
        for n in [0, 1, 3, 10] {
            for problem in [linear_deps(n), tree_deps(n)] {
                let mut e = LinearizationEngine::with_strategy(s);
                problem.apply(&mut e).unwrap();
                let order = e.linearize().unwrap();
                check_linearization(&order, &problem.phases, &problem.edges)
                    .unwrap_or_else(|v| panic!("{s} n={n}: {v}"));
            }
        }
    }
}

#[test]
fn linear_chain_comes_out_reversed() {
    let problem = linear_deps(10);
    let mut expected = problem.phases.clone();
    expected.reverse();
    for s in strategies() {
        let mut e = LinearizationEngine::with_strategy(s);
        problem.apply(&mut e).unwrap();
        assert_eq!(e.linearize().unwrap(), expected, "{s}");
    }
}

#[test]
fn contract_errors_are_uniform() {
    for s in strategies() {
        let mut e = LinearizationEngine::with_strategy(s);
        e.add_phase("a").unwrap();
        e.add_phase("b").unwrap();

        assert_eq!(e.add_phase("a"), Err(Error::DuplicatePhase("a".into())), "{s}");
        assert_eq!(e.add_dependency("a", "zz"), Err(Error::UnknownPhase("zz".into())), "{s}");
        assert_eq!(e.add_dependency("zz", "a"), Err(Error::UnknownPhase("zz".into())), "{s}");
        assert_eq!(e.add_dependency("a", "a"), Err(Error::SelfDependency("a".into())), "{s}");

        // nothing above changed the state
        assert_eq!(e.phase_count(), 2, "{s}");
        assert_eq!(e.edge_count(), 0, "{s}");
        assert_eq!(e.linearize().unwrap(), ids(&["a", "b"]), "{s}");
    }
}

#[test]
fn repeated_edges_are_idempotent() {
    for s in strategies() {
        let mut e = LinearizationEngine::with_strategy(s);
        e.add_phase("a").unwrap();
        e.add_phase("b").unwrap();
        for _ in 0..3 {
            e.add_dependency("a", "b").unwrap();
        }
        assert_eq!(e.edge_count(), 1, "{s}");
        assert_eq!(e.linearize().unwrap(), ids(&["b", "a"]), "{s}");
    }
}

#[test]
fn cycle_state_is_sticky_until_reset() {
    for s in strategies() {
        let mut e = LinearizationEngine::with_strategy(s);
        from_pairs(&[("a", "b"), ("b", "a")]).apply(&mut e).unwrap();
        let first = e.linearize().unwrap_err();
        assert!(e.is_cyclic(), "{s}");

        // mutations are no-ops, even ones that would otherwise fail
        e.add_phase("a").unwrap();
        e.add_phase("c").unwrap();
        e.add_dependency("nope", "a").unwrap();
        e.add_dependency("a", "a").unwrap();
        assert_eq!(e.phase_count(), 2, "{s}");
        assert_eq!(e.linearize().unwrap_err(), first, "{s}");

        e.reset();
        assert!(!e.is_cyclic(), "{s}");
        assert_eq!(e.phase_count(), 0, "{s}");
        assert_eq!(e.edge_count(), 0, "{s}");
        assert!(e.linearize().unwrap().is_empty(), "{s}");

        // phases from before the reset are gone
        e.add_phase("x").unwrap();
        assert_eq!(e.add_dependency("x", "a"), Err(Error::UnknownPhase("a".into())), "{s}");
    }
}

#[test]
fn fail_fast_rejects_only_the_closing_edge() {
    for s in strategies() {
        let mut e = engine_with(s, |c| c.cycle_policy = CyclePolicy::FailFast);
        from_pairs(&[("a", "b"), ("b", "c")]).apply(&mut e).unwrap();

        let err = e.add_dependency("c", "a").unwrap_err();
        assert!(err.is_cycle(), "{s}: {err}");
        assert!(!e.is_cyclic(), "{s}");
        assert_eq!(e.edge_count(), 2, "{s}");

        // the engine keeps working
        e.add_phase("d").unwrap();
        e.add_dependency("d", "a").unwrap();
        assert_eq!(e.linearize().unwrap(), ids(&["c", "b", "a", "d"]), "{s}");
    }
}

#[test]
fn ignore_duplicates_keeps_first_registration() {
    for s in strategies() {
        let mut e = engine_with(s, |c| c.duplicate_policy = DuplicatePolicy::Ignore);
        e.add_phase("a").unwrap();
        e.add_phase("b").unwrap();
        e.add_phase("a").unwrap();
        assert_eq!(e.phase_count(), 2, "{s}");
        assert_eq!(e.linearize().unwrap(), ids(&["a", "b"]), "{s}");
    }
}

#[test]
fn engine_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<LinearizationEngine>();
}
