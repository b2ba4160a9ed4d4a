use calltrace_studio::aggregator::{build_tree, AggregatorOutputs, TraceAggregator};
use calltrace_studio::parser::{parse_line, Edge, TraceResult};
use calltrace_studio::utils::TreeError;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

fn edges(lines: &[&str]) -> Vec<Edge> {
    lines.iter().map(|l| parse_line(l).unwrap()).collect()
}

#[test]
fn test_build_tree_links_by_span() {
    let group = edges(&[
        "2013-10-23T10:12:35.298Z 2013-10-23T10:12:35.300Z eckakaau service3 d6m3shqy->62d45qeh",
        "2013-10-23T10:12:35.293Z 2013-10-23T10:12:35.302Z eckakaau service7 zfjlsiev->d6m3shqy",
        "2013-10-23T10:12:35.286Z 2013-10-23T10:12:35.302Z eckakaau service9 bm6il56t->zfjlsiev",
        "2013-10-23T10:12:35.271Z 2013-10-23T10:12:35.471Z eckakaau service6 null->bm6il56t",
    ]);

    let root = build_tree(&group).unwrap();

    let mut chain = vec![root.span.clone()];
    let mut current = &root;
    while let Some(child) = current.children.first() {
        assert_eq!(current.children.len(), 1);
        chain.push(child.span.clone());
        current = child;
    }
    assert_eq!(chain, vec!["bm6il56t", "zfjlsiev", "d6m3shqy", "62d45qeh"]);
}

#[test]
fn test_build_tree_without_root_uses_first_caller() {
    let group = edges(&[
        "2013-10-23T10:12:35.318Z 2013-10-23T10:12:35.370Z ddeekkk service3 bm6il56t->22buxmqp",
    ]);

    let root = build_tree(&group).unwrap();

    assert_eq!(root.span, "22buxmqp");
    assert_eq!(root.service, "service3");
}

#[test]
fn test_build_tree_rejects_cycles() {
    let group = edges(&[
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t s1 a->b",
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t s2 b->c",
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t s3 c->a",
    ]);

    assert!(matches!(build_tree(&group), Err(TreeError::Cycle { .. })));
}

#[tokio::test]
async fn test_aggregator_routes_outputs() {
    let (malformed_tx, mut malformed_rx) = mpsc::channel(8);
    let (completed_tx, mut completed_rx) = mpsc::channel(8);
    let (orphans_tx, mut orphans_rx) = mpsc::channel(8);
    let (lines_tx, lines_rx) = mpsc::channel(8);

    let aggregator = TraceAggregator::new(
        AggregatorOutputs {
            malformed: malformed_tx,
            completed: completed_tx,
            orphans: orphans_tx,
        },
        None,
    );
    let handle = tokio::spawn(aggregator.run(lines_rx));

    for line in [
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t1 leaf a->b",
        "not a line",
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t2 lonely q->r",
        "2013-10-23T10:12:35.100Z 2013-10-23T10:12:35.200Z t1 entry null->a",
    ] {
        lines_tx.send(line.to_string()).await.unwrap();
    }
    drop(lines_tx);

    let stats = handle.await.unwrap();

    let completed: TraceResult = serde_json::from_str(&completed_rx.recv().await.unwrap()).unwrap();
    assert_eq!(completed.id, "entry");
    assert_eq!(completed.root.children.len(), 1);
    assert!(completed_rx.recv().await.is_none());

    let orphan: TraceResult = serde_json::from_str(&orphans_rx.recv().await.unwrap()).unwrap();
    assert_eq!(orphan.id, "lonely");
    assert!(orphans_rx.recv().await.is_none());

    assert_eq!(malformed_rx.recv().await.unwrap(), "not a line");
    assert!(malformed_rx.recv().await.is_none());

    assert_eq!(stats.lines, 4);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.orphans, 1);
}
