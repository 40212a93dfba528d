use crate::support::{doc_num, node, sled_harness};
use doctree::NodeType;
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add { slot: usize, folder: bool, under: Option<usize> },
    Delete(usize),
    DeleteSubtree(usize),
    Restore(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..6usize, any::<bool>(), proptest::option::of(0..6usize))
            .prop_map(|(slot, folder, under)| Op::Add { slot, folder, under }),
        (0..6usize).prop_map(Op::Delete),
        (0..6usize).prop_map(Op::DeleteSubtree),
        (0..6usize).prop_map(Op::Restore),
    ]
}

fn id(slot: usize) -> String {
    format!("n{}", slot)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn doc_num_matches_live_documents(ops in proptest::collection::vec(op(), 1..20)) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let (expected, recorded) = runtime.block_on(async {
            let h = sled_harness();
            for op in &ops {
                match op {
                    Op::Add { slot, folder, under } => {
                        let node_type = if *folder { NodeType::Folder } else { NodeType::Http };
                        let pid = under.map(id).unwrap_or_default();
                        h.cache.add(node(&id(*slot), "p", &pid, node_type)).await;
                    }
                    Op::Delete(slot) => {
                        h.cache.soft_delete(&id(*slot)).await;
                    }
                    Op::DeleteSubtree(slot) => {
                        h.cache.delete_subtree(&id(*slot)).await;
                    }
                    Op::Restore(slot) => {
                        h.cache.restore(&id(*slot)).await;
                    }
                }
            }
            let expected = h
                .cache
                .get_all(true)
                .await
                .iter()
                .filter(|n| n.project_id == "p" && !n.is_deleted && !n.is_folder())
                .count() as u64;
            (expected, doc_num(&h.projects, "p").await)
        });
        prop_assert_eq!(expected, recorded);
    }
}
