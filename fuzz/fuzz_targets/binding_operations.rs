#![no_main]

use ferrous_ioc::{share, Container, DiError};
use libfuzzer_sys::fuzz_target;

const NAMES: [&str; 6] = ["a", "b", "c", "d", "e", "f"];

// Each byte pair is one operation on a small name space, so aliases,
// rebinding and teardown interleave in arbitrary order.
fuzz_target!(|data: &[u8]| {
    let container = Container::new();

    for chunk in data.chunks(2) {
        let op = chunk[0] % 10;
        let name = NAMES[chunk.get(1).copied().unwrap_or(0) as usize % NAMES.len()];
        let other = NAMES[(chunk[0] as usize / 10) % NAMES.len()];

        match op {
            0 => {
                let _ = container.bind(name, move |_, _| Ok(share(name)));
            }
            1 => {
                let _ = container.singleton(name, move |_, _| Ok(share(name)));
            }
            2 => {
                let _ = container.instance(name, name);
            }
            3 => {
                // Rejected only when `name` already lies on `other`'s chain
                if let Err(DiError::SelfAlias(_)) = container.alias(other, name) {
                    assert!(other == name || container.is_alias(other));
                }
                let _ = container.get_alias(name);
            }
            4 => {
                let _ = container.make(name);
            }
            5 => container.forget_instance(name),
            6 => container.unset(name),
            7 => container.tag([name, other], ["fuzz"]),
            8 => container.forget_scoped_instances(),
            _ => container.flush(),
        }
    }

    let _ = container.binding_descriptors();
});
