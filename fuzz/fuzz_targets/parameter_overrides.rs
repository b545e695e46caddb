#![no_main]

use ferrous_ioc::{constructable, Container, Parameter, Parameters, Resolver};
use libfuzzer_sys::fuzz_target;
use std::sync::Once;

struct Target {
    values: Vec<u8>,
}

static REGISTER: Once = Once::new();

fn register() {
    REGISTER.call_once(|| {
        constructable::<Target>("Target")
            .params([
                Parameter::primitive("first"),
                Parameter::primitive("second").default(0u8),
                Parameter::primitive("rest").variadic(),
            ])
            .register(|args| {
                let mut values = vec![*args.get::<u8>(0)?, *args.get::<u8>(1)?];
                values.extend(args.rest::<u8>(2)?.into_iter().map(|v| *v));
                Ok(Target { values })
            });
    });
}

// Positional frames feed primitives front to back; named frames match by
// name. Either way the build must succeed or fail cleanly, never panic.
fuzz_target!(|data: &[u8]| {
    register();
    let container = Container::new();
    let Some((&mode, bytes)) = data.split_first() else {
        return;
    };

    let parameters = if mode % 2 == 0 {
        bytes
            .iter()
            .fold(Parameters::positional(), |p, b| p.push(*b))
    } else {
        let names = ["first", "second", "rest", "unknown"];
        bytes.iter().enumerate().fold(Parameters::named(), |p, (i, b)| {
            p.with(names[i % names.len()], *b)
        })
    };

    if let Ok(target) =
        container.make_with_as::<Target>(ferrous_ioc::key_of_type::<Target>(), parameters)
    {
        assert!(target.values.len() >= 2);
    }
});
