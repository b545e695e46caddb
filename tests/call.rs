use ferrous_ioc::{
    annotate, constructable, share, Callable, Container, DiError, Function, MethodRef, Parameter,
    Parameters, Receiver, Resolver, Sequence,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

fn strings(values: &[Arc<&'static str>]) -> Vec<&'static str> {
    values.iter().map(|v| **v).collect()
}

#[test]
fn method_receives_positional_arguments() {
    struct ContainerTestCallStub;
    constructable::<ContainerTestCallStub>("ContainerTestCallStub")
        .methodable("work", vec![], |_, args| Ok(share(args.rest::<&'static str>(0)?)))
        .register(|_| Ok(ContainerTestCallStub));

    let container = Container::new();
    let result = container
        .call_as::<Vec<Arc<&'static str>>>(
            MethodRef::on::<ContainerTestCallStub>("work"),
            Parameters::positional().push("a").push("b"),
        )
        .unwrap();
    assert_eq!(strings(&result), vec!["a", "b"]);
}

#[test]
fn method_dependencies_are_injected() {
    struct Logger(&'static str);
    struct Controller;
    constructable::<Logger>("Logger").register(|_| Ok(Logger("default")));
    constructable::<Controller>("Controller")
        .methodable(
            "index",
            vec![Parameter::class::<Logger>("logger"), Parameter::primitive("page").default(1u32)],
            |_, args| {
                let logger = args.get::<Logger>(0)?;
                let page = args.get::<u32>(1)?;
                Ok(share(format!("{}:{}", logger.0, page)))
            },
        )
        .register(|_| Ok(Controller));

    let container = Container::new();
    let result = container
        .call_as::<String>(MethodRef::on::<Controller>("index"), Parameters::default())
        .unwrap();
    assert_eq!(*result, "default:1");

    let result = container
        .call_as::<String>(
            MethodRef::on::<Controller>("index"),
            Parameters::named().with("page", 4u32),
        )
        .unwrap();
    assert_eq!(*result, "default:4");
}

#[test]
fn static_methods_skip_instantiation() {
    struct Builder;
    // Bare: making it would fail
    constructable::<Builder>("Builder")
        .bare()
        .static_methodable("version", vec![Parameter::primitive("prefix").default("v")], |args| {
            Ok(share(format!("{}1", args.get::<&str>(0)?)))
        })
        .register(|_| Ok(Builder));

    let container = Container::new();
    let version = container
        .call_as::<String>(MethodRef::on_static::<Builder>("version"), Parameters::default())
        .unwrap();
    assert_eq!(*version, "v1");
}

#[test]
fn bound_instance_methods_use_the_given_receiver() {
    struct Counter {
        hits: AtomicUsize,
    }
    constructable::<Counter>("Counter")
        .methodable("hit", vec![], |counter, _| {
            Ok(share(counter.hits.fetch_add(1, Ordering::SeqCst) + 1))
        })
        .register(|_| Ok(Counter { hits: AtomicUsize::new(0) }));

    let container = Container::new();
    let counter: ferrous_ioc::AnyArc = share(Counter { hits: AtomicUsize::new(10) });
    let result = container
        .call_as::<usize>(Callable::bound_any(counter.clone(), "hit"), Parameters::default())
        .unwrap();
    assert_eq!(*result, 11);
    assert_eq!(counter.downcast_ref::<Counter>().map(|c| c.hits.load(Ordering::SeqCst)), Some(11));
}

#[test]
fn missing_method_on_unregistered_instance_names_its_type() {
    struct Widget;
    let container = Container::new();

    match container.call(Callable::bound(Arc::new(Widget), "spin"), Parameters::default()) {
        Err(DiError::NotAFunction(target)) => assert_eq!(target, "Widget.prototype.spin"),
        other => panic!("expected not a function, got {:?}", other.err()),
    }
    let err = container
        .call(Callable::bound(Arc::new(Widget), "spin"), Parameters::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Target method [Widget.prototype.spin] is not a function.");
}

#[test]
fn annotated_functions_are_called() {
    struct Mailer;
    let container = Container::new();
    container.instance("mailer", Mailer).unwrap();

    let send = Function::annotated(
        "send",
        vec![
            Parameter::inject("mailer", "mailer"),
            Parameter::primitive("to"),
            Parameter::primitive("cc").default_null(),
        ],
        |args| {
            args.get::<Mailer>(0)?;
            let cc = args.optional::<&str>(2).map(|c| *c).unwrap_or("-");
            Ok(share(format!("{} {}", args.get::<&str>(1)?, cc)))
        },
    );

    let result = container
        .call_as::<String>(send.clone(), Parameters::named().with("to", "taylor"))
        .unwrap();
    assert_eq!(*result, "taylor -");

    match container.call(send, Parameters::default()) {
        Err(DiError::Unresolvable { index, name, class }) => {
            assert_eq!((index, name.as_str(), class.as_str()), (1, "to", "send"));
        }
        other => panic!("expected unresolvable, got {:?}", other.err()),
    }
}

#[test]
fn variadic_call_parameter_splices_sequences() {
    let container = Container::new();
    let join = annotate(
        Function::new("join", |args| {
            Ok(share(args.rest::<&'static str>(0)?.iter().map(|s| **s).collect::<Vec<_>>().join(",")))
        }),
        vec![Parameter::primitive("parts").variadic()],
    );

    let parts: Sequence = vec![share("x"), share("y"), share("z")];
    let joined = container
        .call_as::<String>(join, Parameters::named().with("parts", parts))
        .unwrap();
    assert_eq!(*joined, "x,y,z");
}

#[test]
fn missing_metadata_errors() {
    struct Plain;
    constructable::<Plain>("Plain")
        .method("undecorated", |_, _| Ok(share(())))
        .static_method("helper", |_| Ok(share(())))
        .register(|_| Ok(Plain));

    let container = Container::new();

    let err = container
        .call(Function::new("bare", |_| Ok(share(()))), Parameters::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Target function [bare] must be annotated!");

    let err = container
        .call(MethodRef::on::<Plain>("undecorated"), Parameters::default())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Target method [Plain.prototype.undecorated] must be registered as methodable!"
    );

    let err = container
        .call(MethodRef::on_static::<Plain>("helper"), Parameters::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Target method [Plain.helper] must be registered as methodable!");

    let err = container
        .call(MethodRef::on::<Plain>("missing"), Parameters::default())
        .unwrap_err();
    assert_eq!(err.to_string(), "Target method [Plain.prototype.missing] is not a function.");
}

#[test]
fn method_bindings_override_bodies() {
    struct Job(&'static str);
    constructable::<Job>("Job")
        .methodable("handle", vec![], |_, _| Ok(share("original")))
        .register(|_| Ok(Job("queued")));

    let container = Container::new();
    let method = MethodRef::on::<Job>("handle");
    assert!(!container.has_method_binding(&method));

    container.bind_method(method.clone(), |receiver, _| {
        let job = receiver
            .instance()
            .and_then(|j| j.downcast_ref::<Job>())
            .map(|j| j.0)
            .unwrap_or("none");
        Ok(share(job))
    });
    assert!(container.has_method_binding(&method));
    assert_eq!(*container.call_as::<&str>(method.clone(), Parameters::default()).unwrap(), "queued");

    let direct = container
        .call_method_binding(&method, &Receiver::Static(ferrous_ioc::key_of_type::<Job>()))
        .unwrap();
    assert_eq!(direct.downcast_ref::<&str>(), Some(&"none"));
}

#[test]
fn wrap_defers_the_call() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    let tick = Function::annotated("tick", vec![], move |_| {
        Ok(share(counted.fetch_add(1, Ordering::SeqCst)))
    });

    let container = Container::new();
    let deferred = container.wrap(tick, Parameters::default());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    deferred().unwrap();
    deferred().unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
