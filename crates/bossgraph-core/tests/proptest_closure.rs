use bossgraph_core::loader::sqlite::{ensure_schema, insert_employee, sql_closure};
use bossgraph_core::loader::json::{EmployeeRecord, JsonLoader};
use bossgraph_core::{
    ClosureEngine, ClosureLimits, EntityId, compute_all_partitions, compute_closure,
    group_by_ancestor,
};
use proptest::prelude::*;
use rusqlite::Connection;
use std::collections::HashSet;

use generators::*;

fn pairs_of(edges: &[(u32, u32)]) -> HashSet<(u32, u32)> {
    compute_closure(&anchors_from(edges))
        .iter()
        .map(|edge| (edge.id, edge.parent_id))
        .collect()
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(512))]

    #[test]
    fn no_entity_is_its_own_ancestor(edges in arb_edges(12, 40)) {
        let closure = compute_closure(&anchors_from(&edges));
        for edge in &closure {
            prop_assert_ne!(edge.id, edge.parent_id);
        }
    }

    #[test]
    fn closure_contains_every_non_loop_anchor(edges in arb_edges(12, 40)) {
        let closure = compute_closure(&anchors_from(&edges));
        for &(id, parent) in &edges {
            if id != parent {
                prop_assert!(closure.contains(&id, &parent), "missing anchor ({id}, {parent})");
            }
        }
    }

    #[test]
    fn closure_is_transitively_closed(edges in arb_edges(10, 30)) {
        let pairs = pairs_of(&edges);
        for &(a, b) in &pairs {
            for &(c, d) in &pairs {
                if b == c && a != d {
                    prop_assert!(pairs.contains(&(a, d)), "({a},{b}) + ({c},{d}) not closed");
                }
            }
        }
    }

    #[test]
    fn matches_per_node_bfs(edges in arb_edges(16, 60)) {
        prop_assert_eq!(pairs_of(&edges), naive_closure(&edges));
    }

    #[test]
    fn closing_the_closure_is_idempotent(edges in arb_edges(12, 40)) {
        let once: Vec<(u32, u32)> = pairs_of(&edges).into_iter().collect();
        let twice = pairs_of(&once);
        prop_assert_eq!(twice, once.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn duplicate_edges_do_not_change_the_result(edges in arb_edges(12, 30)) {
        let mut doubled = edges.clone();
        doubled.extend(edges.iter().copied());
        prop_assert_eq!(pairs_of(&doubled), pairs_of(&edges));
    }

    #[test]
    fn pair_count_is_bounded_quadratically(edges in arb_edges(12, 40)) {
        let anchors = anchors_from(&edges);
        let n = anchors.entities().len();
        let closure = compute_closure(&anchors);
        prop_assert!(closure.len() <= n * n.saturating_sub(1));
    }

    #[test]
    fn unbounded_engine_agrees_with_free_function(edges in arb_edges(12, 40)) {
        let anchors = anchors_from(&edges);
        let engine = ClosureEngine::new(ClosureLimits::default());
        let limited = engine.compute(&anchors).expect("no limits configured");
        prop_assert_eq!(limited, compute_closure(&anchors));
    }

    #[test]
    fn groups_account_for_every_pair(edges in arb_edges(12, 40)) {
        let closure = compute_closure(&anchors_from(&edges));
        let groups = group_by_ancestor(&closure);
        prop_assert_eq!(groups.membership_count(), closure.len());
        for edge in &closure {
            prop_assert!(groups.get(&edge.parent_id).is_some_and(|d| d.contains(&edge.id)));
        }
    }

    #[test]
    fn sqlite_recursive_query_agrees(bosses in arb_bosses(14)) {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        ensure_schema(&conn).expect("schema");
        let company = EntityId::Int(1);
        for (&id, boss) in &bosses {
            let boss = boss.map(|b| EntityId::Int(i64::from(b)));
            insert_employee(&conn, &EntityId::Int(i64::from(id)), boss.as_ref(), &company)
                .expect("insert");
        }

        let edges: Vec<(u32, u32)> = bosses
            .iter()
            .filter_map(|(&id, &boss)| boss.map(|b| (id, b)))
            .collect();
        let expected: HashSet<(i64, i64)> = pairs_of(&edges)
            .into_iter()
            .map(|(a, b)| (i64::from(a), i64::from(b)))
            .collect();

        let from_sql: HashSet<(i64, i64)> = sql_closure(&conn, &company)
            .expect("sql closure")
            .into_iter()
            .map(|edge| match (edge.id, edge.parent_id) {
                (EntityId::Int(a), EntityId::Int(b)) => (a, b),
                other => panic!("unexpected text ids {other:?}"),
            })
            .collect();

        prop_assert_eq!(from_sql, expected);
    }

    #[test]
    fn partitions_do_not_leak(bosses in arb_bosses(20)) {
        let records: Vec<EmployeeRecord> = bosses
            .iter()
            .map(|(&id, &boss)| EmployeeRecord {
                id: EntityId::Int(i64::from(id)),
                boss_id: boss.map(|b| EntityId::Int(i64::from(b))),
                company_id: EntityId::Int(i64::from(id % 2)),
                name: None,
            })
            .collect();
        let loader = JsonLoader::new(records);
        let results = compute_all_partitions(&ClosureEngine::unbounded(), &loader)
            .expect("partitions");

        for (company, result) in &results {
            let EntityId::Int(company) = company else {
                panic!("unexpected partition id {company:?}");
            };
            let edges: Vec<(u32, u32)> = bosses
                .iter()
                .filter(|&(&id, _)| i64::from(id % 2) == *company)
                .filter_map(|(&id, &boss)| boss.map(|b| (id, b)))
                .collect();
            prop_assert_eq!(result.groups.membership_count(), pairs_of(&edges).len());

            for (_, descendants) in result.groups.iter() {
                for id in descendants {
                    let EntityId::Int(id) = id else {
                        panic!("unexpected id {id:?}");
                    };
                    prop_assert_eq!(id % 2, *company);
                }
            }
        }
    }
}
