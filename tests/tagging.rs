use ferrous_ioc::{share, Container, DiError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn names(container: &Container, tag: &str) -> Vec<&'static str> {
    container
        .tagged(tag)
        .iter()
        .map(|r| *r.unwrap().downcast_ref::<&'static str>().unwrap())
        .collect()
}

#[test]
fn tagged_abstracts_resolve_in_order() {
    let container = Container::new();
    container.bind("cpu", |_, _| Ok(share("cpu"))).unwrap();
    container.bind("memory", |_, _| Ok(share("memory"))).unwrap();
    container.bind("disk", |_, _| Ok(share("disk"))).unwrap();
    container.tag(["cpu", "memory"], ["reports", "hardware"]);
    container.tag(["disk"], ["hardware"]);

    assert_eq!(names(&container, "reports"), vec!["cpu", "memory"]);
    assert_eq!(names(&container, "hardware"), vec!["cpu", "memory", "disk"]);
    assert!(container.tagged("unknown").is_empty());
}

#[test]
fn tagged_members_resolve_lazily() {
    let container = Container::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let c = calls.clone();
    container
        .bind("lazy", move |_, _| Ok(share(c.fetch_add(1, Ordering::SeqCst))))
        .unwrap();
    container.tag(["lazy"], ["group"]);

    let group = container.tagged("group");
    assert_eq!(group.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    group.resolve_all().unwrap();
    group.resolve_all().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[test]
fn tagged_iteration_sees_rebinding() {
    let container = Container::new();
    container.bind("member", |_, _| Ok(share("old"))).unwrap();
    container.tag(["member"], ["group"]);
    let group = container.tagged("group");

    container.bind("member", |_, _| Ok(share("new"))).unwrap();
    let value = group.iter().next().unwrap().unwrap();
    assert_eq!(value.downcast_ref::<&str>(), Some(&"new"));
}

#[test]
fn failing_member_fails_resolve_all() {
    let container = Container::new();
    container.bind("ok", |_, _| Ok(share("ok"))).unwrap();
    container.tag(["ok", "missing"], ["group"]);

    match container.tagged("group").resolve_all() {
        Err(DiError::NotInstantiable { target, .. }) => assert_eq!(target, "missing"),
        other => panic!("expected not instantiable, got {:?}", other.err()),
    }
}
