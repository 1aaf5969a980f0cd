//! Catalog-level integration tests for weighted alias selection.
//!
//! These tests go through Hickory's full `Catalog` → `RequestHandler::handle_request()`
//! → `Authority::search()` → selector pipeline. No network privileges required.

mod common;

use common::*;
use hickory_proto::op::ResponseCode;
use hickory_proto::rr::RecordType;
use std::collections::HashMap;

// =========================================================================
// Weighted selection
// =========================================================================

#[tokio::test]
async fn apex_weights_follow_smooth_sequence() {
    let (_server, catalog) = build_server(test_dns_config(vec![weight(ORIGIN, 2, 1)]));

    let targets = query_targets(&catalog, API_NAME, 10).await;

    let cycle = [VM_X, VM_Y, VM_X, VM_Y, CLUSTER_Z];
    assert_eq!(targets[..5], cycle);
    assert_eq!(targets[5..], cycle);
}

#[tokio::test]
async fn owner_weights_override_apex() {
    let (_server, catalog) = build_server(test_dns_config(vec![
        weight(ORIGIN, 1, 0),
        weight(API_NAME, 0, 1),
    ]));

    let targets = query_targets(&catalog, API_NAME, 4).await;
    assert!(targets.iter().all(|t| t == CLUSTER_Z), "{targets:?}");
}

#[tokio::test]
async fn split_matches_weight_ratio() {
    let (_server, catalog) = build_server(test_dns_config(vec![weight(API_NAME, 1, 3)]));

    // Pool weights [1, 1, 3], cycle of 5
    let targets = query_targets(&catalog, API_NAME, 50).await;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for target in &targets {
        *counts.entry(target.as_str()).or_default() += 1;
    }

    assert_eq!(counts[VM_X], 10);
    assert_eq!(counts[VM_Y], 10);
    assert_eq!(counts[CLUSTER_Z], 30);
}

#[tokio::test]
async fn names_sharing_apex_weights_keep_their_own_targets() {
    let (_server, catalog) = build_server(test_dns_config(vec![weight(ORIGIN, 1, 1)]));

    assert_eq!(query_targets(&catalog, API_NAME, 1).await, vec![VM_X]);

    let www = query_targets(&catalog, "www.example.com", 4).await;
    assert!(www.iter().all(|t| t == "web-1.ec2.internal."), "{www:?}");

    // api resumes its own sequence
    let msg = execute_query(&catalog, API_NAME, RecordType::CNAME, 99).await;
    assert_eq!(single_cname(&msg), VM_Y);
}

#[tokio::test]
async fn zero_weights_answer_first_record() {
    let (_server, catalog) = build_server(test_dns_config(vec![weight(ORIGIN, 0, 0)]));

    let targets = query_targets(&catalog, API_NAME, 3).await;
    assert_eq!(targets, vec![VM_X, VM_X, VM_X]);
}

#[tokio::test]
async fn any_query_type_gets_the_cname() {
    let (_server, catalog) = build_server(test_dns_config(vec![weight(ORIGIN, 1, 0)]));

    for (id, rtype) in [RecordType::A, RecordType::AAAA, RecordType::TXT]
        .into_iter()
        .enumerate()
    {
        let msg = execute_query(&catalog, API_NAME, rtype, id as u16).await;
        let target = single_cname(&msg);
        assert!(target == VM_X || target == VM_Y, "{rtype:?} -> {target}");
    }
}

// =========================================================================
// Unweighted names
// =========================================================================

#[tokio::test]
async fn unweighted_name_returns_a_member() {
    let (_server, catalog) = build_server(test_dns_config(vec![]));

    let targets = query_targets(&catalog, API_NAME, 30).await;
    for target in &targets {
        assert!(
            [VM_X, VM_Y, CLUSTER_Z].contains(&target.as_str()),
            "unexpected target {target}"
        );
    }
}

#[tokio::test]
async fn single_alias_is_stable() {
    let (_server, catalog) = build_server(test_dns_config(vec![]));

    let targets = query_targets(&catalog, "www.example.com", 5).await;
    assert!(targets.iter().all(|t| t == "web-1.ec2.internal."));
}

// =========================================================================
// Zone answers
// =========================================================================

#[tokio::test]
async fn unknown_name_is_nxdomain() {
    let (_server, catalog) = build_server(test_dns_config(vec![]));

    let msg = execute_query(&catalog, "nope.example.com", RecordType::CNAME, 1).await;
    assert_response_code(&msg, ResponseCode::NXDomain);
    assert!(extract_cname_targets(&msg).is_empty());
}

#[tokio::test]
async fn apex_soa_is_served() {
    let (_server, catalog) = build_server(test_dns_config(vec![]));

    let msg = execute_query(&catalog, "example.com", RecordType::SOA, 1).await;
    assert_response_code(&msg, ResponseCode::NoError);
    assert_eq!(msg.answers().len(), 1);
}

// =========================================================================
// Reload
// =========================================================================

#[tokio::test]
async fn zone_reload_restarts_sequence_with_new_targets() {
    let (server, catalog) = build_server(test_dns_config(vec![weight(ORIGIN, 2, 1)]));

    let before = query_targets(&catalog, API_NAME, 2).await;
    assert_eq!(before, vec![VM_X, VM_Y]);

    server
        .reload_zone(&zone_with_targets(&["n.ec2.internal.", "n.svc.cluster.local."]))
        .unwrap();

    let after = query_targets(&catalog, API_NAME, 3).await;
    assert_eq!(
        after,
        vec!["n.ec2.internal.", "n.ec2.internal.", "n.svc.cluster.local."]
    );
}
