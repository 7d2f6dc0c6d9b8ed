use std::collections::HashMap;
use std::sync::Arc;

use container_db_rust::{
    is_placeholder, Batch, BatchCoordinator, BatchErrorKind, Container, ContainerGraph,
    ContainerStore, DanglingEdgePolicy, Instruction, MemoryStore,
};

fn coordinator(store: &Arc<MemoryStore>) -> BatchCoordinator<MemoryStore> {
    BatchCoordinator::new(store.clone(), DanglingEdgePolicy::Prune)
}

fn create(target: &str, name: &str) -> Instruction {
    Instruction::Create {
        target: target.to_string(),
        name: name.to_string(),
        fields: HashMap::new(),
    }
}

fn add_child(target: &str, child: &str) -> Instruction {
    Instruction::AddChild {
        target: target.to_string(),
        child: child.to_string(),
        label: None,
    }
}

async fn seed_project(store: &MemoryStore, project: &str, ids: &[&str]) {
    let mut graph = ContainerGraph::new();
    for id in ids {
        graph.insert(Container::new(
            id.to_string(),
            format!("Seed {}", id),
            HashMap::new(),
        ));
    }
    store.save_project(project, &graph).await.unwrap();
}

/// Every string anywhere in the serialized graph must be outside the
/// placeholder namespace once a batch has committed.
fn assert_no_placeholders(value: &serde_json::Value) {
    match value {
        serde_json::Value::String(s) => assert!(
            !is_placeholder(s),
            "persisted value '{}' is placeholder-shaped",
            s
        ),
        serde_json::Value::Array(items) => items.iter().for_each(assert_no_placeholders),
        serde_json::Value::Object(map) => {
            for (key, nested) in map {
                assert!(!is_placeholder(key), "persisted key '{}' is placeholder-shaped", key);
                assert_no_placeholders(nested);
            }
        }
        _ => {}
    }
}

#[tokio::test]
async fn scenario_a_create_then_attach_existing_child() {
    let store = Arc::new(MemoryStore::new());
    seed_project(&store, "demo", &["existing-42"]).await;

    let batch = Batch {
        instructions: vec![create("tmp-1", "Parent"), add_child("tmp-1", "existing-42")],
    };

    let response = coordinator(&store).run("demo", &batch).await.unwrap();

    let generated = response.placeholder_mapping.get("tmp-1").unwrap().clone();
    assert!(!is_placeholder(&generated));
    assert_eq!(response.placeholder_mapping.len(), 1);
    assert_eq!(response.result.len(), 2);
    assert_eq!(response.result[1].target, generated);

    let graph = store.load_project("demo").await.unwrap().unwrap();
    let parent = graph.get(&generated).unwrap();
    assert!(parent.has_child("existing-42"));

    assert_no_placeholders(&serde_json::to_value(&graph).unwrap());
}

#[tokio::test]
async fn scenario_b_reference_without_create_fails_fast() {
    let store = Arc::new(MemoryStore::new());
    seed_project(&store, "demo", &["existing-1"]).await;

    let batch = Batch {
        instructions: vec![add_child("tmp-9", "existing-1")],
    };

    let err = coordinator(&store).run("demo", &batch).await.unwrap_err();
    assert_eq!(err.index, Some(0));
    assert_eq!(
        err.kind,
        BatchErrorKind::UnresolvedPlaceholder("tmp-9".to_string())
    );

    // The seeded project is untouched
    let graph = store.load_project("demo").await.unwrap().unwrap();
    assert_eq!(graph.len(), 1);
}

#[tokio::test]
async fn scenario_c_duplicate_placeholder_registration() {
    let store = Arc::new(MemoryStore::new());

    let batch = Batch {
        instructions: vec![create("tmp-1", "First"), create("tmp-1", "Second")],
    };

    let err = coordinator(&store).run("demo", &batch).await.unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(
        err.kind,
        BatchErrorKind::DuplicatePlaceholder("tmp-1".to_string())
    );

    // Nothing was persisted
    assert!(store.load_project("demo").await.unwrap().is_none());
}

#[tokio::test]
async fn scenario_d_forward_reference_is_rejected() {
    let store = Arc::new(MemoryStore::new());

    let batch = Batch {
        instructions: vec![
            create("tmp-1", "A"),
            Instruction::Relate {
                target: "tmp-1".to_string(),
                other: "tmp-2".to_string(),
                position: serde_json::Map::new(),
            },
            create("tmp-2", "B"),
        ],
    };

    let err = coordinator(&store).run("demo", &batch).await.unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(
        err.kind,
        BatchErrorKind::UnresolvedPlaceholder("tmp-2".to_string())
    );
    assert!(store.load_project("demo").await.unwrap().is_none());
}

#[tokio::test]
async fn mapping_has_one_fresh_id_per_distinct_placeholder() {
    let store = Arc::new(MemoryStore::new());

    let batch = Batch {
        instructions: vec![
            create("tmp-a", "A"),
            create("tmp-b", "B"),
            create("tmp-c", "C"),
            add_child("tmp-a", "tmp-b"),
            add_child("tmp-a", "tmp-c"),
        ],
    };

    let response = coordinator(&store).run("demo", &batch).await.unwrap();

    assert_eq!(response.placeholder_mapping.len(), 3);
    let mut ids: Vec<&String> = response.placeholder_mapping.values().collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 3, "every placeholder got a distinct real id");
    for id in ids {
        assert!(!is_placeholder(id));
    }

    let graph = store.load_project("demo").await.unwrap().unwrap();
    assert_eq!(graph.len(), 3);
    let parent_id = &response.placeholder_mapping["tmp-a"];
    assert_eq!(graph.children_of(parent_id).len(), 2);
}

#[tokio::test]
async fn execution_failure_persists_nothing() {
    let store = Arc::new(MemoryStore::new());
    seed_project(&store, "demo", &["existing-1"]).await;

    let batch = Batch {
        instructions: vec![
            create("tmp-1", "Created before the failure"),
            Instruction::Modify {
                target: "missing-id".to_string(),
                name: None,
                fields: HashMap::new(),
            },
        ],
    };

    let err = coordinator(&store).run("demo", &batch).await.unwrap_err();
    assert_eq!(err.index, Some(1));
    assert_eq!(
        err.kind,
        BatchErrorKind::UnknownEntity("missing-id".to_string())
    );

    // The create at index 0 must not be visible afterwards
    let graph = store.load_project("demo").await.unwrap().unwrap();
    assert_eq!(graph.len(), 1);
    assert!(graph.contains("existing-1"));
}

#[tokio::test]
async fn duplicate_entity_on_client_chosen_id() {
    let store = Arc::new(MemoryStore::new());
    seed_project(&store, "demo", &["existing-1"]).await;

    let batch = Batch {
        instructions: vec![create("existing-1", "Clash")],
    };

    let err = coordinator(&store).run("demo", &batch).await.unwrap_err();
    assert_eq!(err.index, Some(0));
    assert_eq!(
        err.kind,
        BatchErrorKind::DuplicateEntity("existing-1".to_string())
    );
}

#[tokio::test]
async fn reject_policy_blocks_delete_of_referenced_container() {
    let store = Arc::new(MemoryStore::new());
    seed_project(&store, "demo", &["parent", "child"]).await;

    let attach = Batch {
        instructions: vec![add_child("parent", "child")],
    };
    coordinator(&store).run("demo", &attach).await.unwrap();

    let delete = Batch {
        instructions: vec![Instruction::Delete {
            target: "child".to_string(),
        }],
    };

    let rejecting = BatchCoordinator::new(store.clone(), DanglingEdgePolicy::Reject);
    let err = rejecting.run("demo", &delete).await.unwrap_err();
    assert_eq!(
        err.kind,
        BatchErrorKind::DanglingReference {
            id: "child".to_string(),
            referrers: vec!["parent".to_string()],
        }
    );

    // Default prune policy removes the container and the stale edge
    coordinator(&store).run("demo", &delete).await.unwrap();
    let graph = store.load_project("demo").await.unwrap().unwrap();
    assert!(!graph.contains("child"));
    assert!(graph.get("parent").unwrap().children.is_empty());
}

#[tokio::test]
async fn placeholders_resolve_inside_nested_payload_values() {
    let store = Arc::new(MemoryStore::new());

    let batch = Batch {
        instructions: vec![
            create("tmp-root", "Root"),
            Instruction::Modify {
                target: "tmp-root".to_string(),
                name: None,
                fields: HashMap::from([(
                    "Links".to_string(),
                    serde_json::json!({"primary": "tmp-root", "all": [["tmp-root"]]}),
                )]),
            },
        ],
    };

    let response = coordinator(&store).run("demo", &batch).await.unwrap();
    let real = response.placeholder_mapping.get("tmp-root").unwrap();

    let graph = store.load_project("demo").await.unwrap().unwrap();
    let container = graph.get(real).unwrap();
    assert_eq!(
        container.fields["Links"],
        serde_json::json!({"primary": real, "all": [[real]]})
    );
    assert_no_placeholders(&serde_json::to_value(&graph).unwrap());
}
