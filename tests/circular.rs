use ferrous_ioc::{
    constructable, share, Container, ContainerOptions, DiError, Parameter, Resolver,
};

#[derive(Debug)]
struct CircularAStub;
#[derive(Debug)]
struct CircularBStub;
struct CircularCStub;

fn register_cycle() {
    constructable::<CircularAStub>("CircularAStub")
        .param(Parameter::class::<CircularBStub>("b"))
        .register(|_| Ok(CircularAStub));
    constructable::<CircularBStub>("CircularBStub")
        .param(Parameter::class::<CircularCStub>("c"))
        .register(|_| Ok(CircularBStub));
    constructable::<CircularCStub>("CircularCStub")
        .param(Parameter::class::<CircularAStub>("a"))
        .register(|_| Ok(CircularCStub));
}

#[test]
fn three_class_cycle_is_detected() {
    register_cycle();
    let container = Container::new();

    match container.make_type::<CircularAStub>() {
        Err(DiError::Circular { index, name, class, path }) => {
            assert_eq!(index, 0);
            assert_eq!(name, "a");
            assert_eq!(class, "CircularCStub");
            assert_eq!(
                path,
                vec!["CircularAStub", "CircularBStub", "CircularCStub", "CircularAStub"]
            );
        }
        other => panic!("expected circular error, got {:?}", other.err()),
    }
}

#[test]
fn cycle_message_names_the_path() {
    register_cycle();
    let container = Container::new();
    let err = container.make_type::<CircularBStub>().unwrap_err();
    assert!(err.is_circular());
    assert!(err.is_binding_resolution());
    assert_eq!(
        err.to_string(),
        "Circular dependency resolving [[Parameter #0 [ <required> b ]] in class CircularAStub: \
         CircularBStub -> CircularCStub -> CircularAStub -> CircularBStub."
    );
}

#[test]
fn self_dependency_is_detected() {
    struct SelfReferencing;
    constructable::<SelfReferencing>("SelfReferencing")
        .param(Parameter::class::<SelfReferencing>("me"))
        .register(|_| Ok(SelfReferencing));

    let container = Container::new();
    match container.make_type::<SelfReferencing>() {
        Err(DiError::Circular { name, path, .. }) => {
            assert_eq!(name, "me");
            assert_eq!(path, vec!["SelfReferencing", "SelfReferencing"]);
        }
        other => panic!("expected circular error, got {:?}", other.err()),
    }
}

#[test]
fn cycles_ignore_defaults() {
    #[derive(Debug)]
    struct Left;
    struct Right;
    constructable::<Left>("Left")
        .param(Parameter::class::<Right>("right").default_null())
        .register(|_| Ok(Left));
    constructable::<Right>("Right")
        .param(Parameter::class::<Left>("left"))
        .register(|_| Ok(Right));

    let container = Container::new();
    let err = container.make_type::<Left>().unwrap_err();
    assert!(err.is_circular());
}

#[test]
fn degraded_parameter_type_reports_cycle() {
    struct Degraded;
    constructable::<Degraded>("Degraded")
        .params([Parameter::primitive("first").default(1u8), Parameter::unresolved("peer")])
        .register(|_| Ok(Degraded));

    let container = Container::new();
    match container.make_type::<Degraded>() {
        Err(DiError::Circular { index, name, class, path }) => {
            assert_eq!((index, name.as_str(), class.as_str()), (1, "peer", "Degraded"));
            assert_eq!(path, vec!["Degraded"]);
        }
        other => panic!("expected circular error, got {:?}", other.err()),
    }
}

#[test]
fn stacks_unwind_after_failure() {
    register_cycle();
    struct Healthy;
    struct Consumer;
    constructable::<Healthy>("Healthy").register(|_| Ok(Healthy));
    constructable::<Consumer>("Consumer")
        .param(Parameter::inject("x", "missing"))
        .register(|_| Ok(Consumer));

    let container = Container::new();
    assert!(container.make_type::<CircularAStub>().is_err());
    assert!(container.make_type::<Healthy>().is_ok());

    // A stale build stack would show up in the not-instantiable chain
    match container.make_type::<Consumer>() {
        Err(DiError::NotInstantiable { target, building }) => {
            assert_eq!(target, "missing");
            assert_eq!(building, vec!["Consumer"]);
        }
        other => panic!("expected not instantiable, got {:?}", other.err()),
    }

    // The same cycle is reported identically on a second attempt
    let again = container.make_type::<CircularAStub>().unwrap_err();
    assert!(again.to_string().starts_with(
        "Circular dependency resolving [[Parameter #0 [ <required> a ]] in class CircularCStub"
    ));
}

#[test]
fn closure_recursion_hits_depth_limit() {
    let container = Container::with_options(ContainerOptions::new().max_depth(16));
    container.bind("loop", |container, _| container.make("loop")).unwrap();

    match container.make("loop") {
        Err(DiError::DepthExceeded(depth)) => assert_eq!(depth, 16),
        other => panic!("expected depth error, got {:?}", other.err()),
    }
    // Frames are released, so unrelated resolution still works
    container.bind("ok", |_, _| Ok(share(1u8))).unwrap();
    assert_eq!(*container.make_as::<u8>("ok").unwrap(), 1);
}

#[test]
fn default_depth_limit_trips_before_the_stack_runs_out() {
    // Default-sized thread stack, independent of the test harness settings
    let outcome = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(|| {
            let container = Container::new();
            container.bind("a", |c, _| c.make("a")).unwrap();
            container.make("a").err()
        })
        .unwrap()
        .join()
        .unwrap();

    match outcome {
        Some(DiError::DepthExceeded(depth)) => assert_eq!(depth, ferrous_ioc::DEFAULT_MAX_DEPTH),
        other => panic!("expected depth error, got {:?}", other),
    }
}

#[test]
fn depth_limit_applies_to_chains() {
    let container = Container::with_options(ContainerOptions::new().max_depth(3));
    container.bind("a", |c, _| c.make("b")).unwrap();
    container.bind("b", |c, _| c.make("c")).unwrap();
    container.bind("c", |_, _| Ok(share("leaf"))).unwrap();
    assert_eq!(*container.make_as::<&str>("a").unwrap(), "leaf");

    container.bind("d", |_, _| Ok(share("too deep"))).unwrap();
    container.bind("c", |c, _| c.make("d")).unwrap();
    assert!(matches!(container.make("a"), Err(DiError::DepthExceeded(3))));
    assert_eq!(*container.make_as::<&str>("b").unwrap(), "too deep");
}
