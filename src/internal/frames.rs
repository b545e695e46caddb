//! Per-call resolution state: the build stack and the parameter override stack.
//!
//! Both stacks live in thread-local storage keyed by container id, so two
//! threads resolving from the same container never see each other's frames.
//! Frames are pushed through guards and popped on drop, which keeps the
//! stacks balanced on every exit path including `?` propagation.

use std::cell::RefCell;
use std::collections::HashMap;

use smallvec::SmallVec;

use crate::error::{DiError, DiResult};
use crate::key::Key;
use crate::parameters::{AnyArc, Parameters};

thread_local! {
    static FRAMES: RefCell<HashMap<u64, Frames>> = RefCell::new(HashMap::new());
}

#[derive(Default)]
struct Frames {
    // Build chains rarely go deeper than a handful of classes
    build: SmallVec<[Key; 8]>,
    with: Vec<Parameters>,
}

impl Frames {
    fn is_empty(&self) -> bool {
        self.build.is_empty() && self.with.is_empty()
    }
}

fn with_frames<R>(container: u64, f: impl FnOnce(&mut Frames) -> R) -> R {
    FRAMES.with(|tls| {
        let mut map = tls.borrow_mut();
        let frames = map.entry(container).or_default();
        let out = f(frames);
        if frames.is_empty() {
            map.remove(&container);
        }
        out
    })
}

fn read_frames<R>(container: u64, f: impl FnOnce(Option<&Frames>) -> R) -> R {
    FRAMES.with(|tls| f(tls.borrow().get(&container)))
}

/// Guard for one entry on the build stack
pub(crate) struct BuildGuard {
    container: u64,
}

impl BuildGuard {
    /// Pushes `class` unless it is already being built.
    ///
    /// On re-entry the returned error carries the cycle path but no parameter
    /// yet; the dependency resolver that triggered it fills that in.
    pub(crate) fn push(container: u64, class: &Key) -> DiResult<Self> {
        with_frames(container, |frames| {
            if frames.build.iter().any(|k| k == class) {
                let mut path: Vec<String> = frames.build.iter().map(Key::display_name).collect();
                path.push(class.display_name());
                return Err(DiError::Circular {
                    index: 0,
                    name: String::new(),
                    class: class.display_name(),
                    path,
                });
            }
            frames.build.push(class.clone());
            Ok(())
        })?;
        Ok(Self { container })
    }
}

impl Drop for BuildGuard {
    fn drop(&mut self) {
        with_frames(self.container, |frames| {
            frames.build.pop();
        });
    }
}

/// Guard for one parameter override frame
pub(crate) struct WithGuard {
    container: u64,
}

impl WithGuard {
    /// Pushes `parameters`, failing once `max_depth` frames are active.
    ///
    /// Class builds on the stack count towards the limit too, since each
    /// one adds several native frames on top of its resolution.
    pub(crate) fn push(container: u64, parameters: Parameters, max_depth: usize) -> DiResult<Self> {
        with_frames(container, |frames| {
            let depth = frames.with.len() + frames.build.len();
            if depth >= max_depth {
                return Err(DiError::DepthExceeded(depth));
            }
            frames.with.push(parameters);
            Ok(())
        })?;
        Ok(Self { container })
    }
}

impl Drop for WithGuard {
    fn drop(&mut self) {
        with_frames(self.container, |frames| {
            frames.with.pop();
        });
    }
}

/// Class currently on top of the build stack.
pub(crate) fn current_build(container: u64) -> Option<Key> {
    read_frames(container, |frames| frames.and_then(|f| f.build.last().cloned()))
}

/// Display names of the build stack, outermost first.
pub(crate) fn build_stack(container: u64) -> Vec<String> {
    read_frames(container, |frames| {
        frames
            .map(|f| f.build.iter().map(Key::display_name).collect())
            .unwrap_or_default()
    })
}

/// Clone of the innermost override frame, or an empty named frame.
pub(crate) fn last_parameters(container: u64) -> Parameters {
    read_frames(container, |frames| {
        frames
            .and_then(|f| f.with.last().cloned())
            .unwrap_or_default()
    })
}

/// Named override for `name` in the innermost frame.
pub(crate) fn named_override(container: u64, name: &str) -> Option<AnyArc> {
    read_frames(container, |frames| {
        frames
            .and_then(|f| f.with.last())
            .and_then(|p| p.get(name).cloned())
    })
}

/// Shifts the next positional override off the innermost frame.
pub(crate) fn shift_positional(container: u64) -> Option<AnyArc> {
    FRAMES.with(|tls| {
        tls.borrow_mut()
            .get_mut(&container)
            .and_then(|f| f.with.last_mut())
            .and_then(Parameters::shift)
    })
}

/// Active resolutions and builds for `container` on this thread.
pub(crate) fn depth(container: u64) -> usize {
    read_frames(container, |frames| {
        frames.map_or(0, |f| f.with.len() + f.build.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::key_of_type;

    struct A;
    struct B;

    #[test]
    fn guards_unwind_in_order() {
        let id = 9_001;
        {
            let _a = BuildGuard::push(id, &key_of_type::<A>()).unwrap();
            let _b = BuildGuard::push(id, &key_of_type::<B>()).unwrap();
            assert_eq!(build_stack(id), vec!["A".to_string(), "B".to_string()]);
            assert_eq!(current_build(id), Some(key_of_type::<B>()));
        }
        assert!(build_stack(id).is_empty());
        FRAMES.with(|tls| assert!(!tls.borrow().contains_key(&id)));
    }

    #[test]
    fn builds_count_towards_depth() {
        let id = 9_004;
        let _with = WithGuard::push(id, Parameters::default(), 3).unwrap();
        let _a = BuildGuard::push(id, &key_of_type::<A>()).unwrap();
        let _b = BuildGuard::push(id, &key_of_type::<B>()).unwrap();
        assert_eq!(depth(id), 3);
        assert!(matches!(
            WithGuard::push(id, Parameters::default(), 3),
            Err(DiError::DepthExceeded(3))
        ));
    }

    #[test]
    fn reentry_reports_cycle_path() {
        let id = 9_002;
        let _a = BuildGuard::push(id, &key_of_type::<A>()).unwrap();
        let _b = BuildGuard::push(id, &key_of_type::<B>()).unwrap();
        match BuildGuard::push(id, &key_of_type::<A>()) {
            Err(DiError::Circular { path, .. }) => assert_eq!(path, vec!["A", "B", "A"]),
            _ => panic!("expected circular error"),
        }
        assert_eq!(build_stack(id).len(), 2);
    }

    #[test]
    fn with_frames_shift_and_depth() {
        let id = 9_003;
        let _outer = WithGuard::push(id, Parameters::named().with("x", 1u8), 4).unwrap();
        {
            let _inner = WithGuard::push(id, Parameters::positional().push(7u8), 4).unwrap();
            assert!(named_override(id, "x").is_none());
            let shifted = shift_positional(id).unwrap();
            assert_eq!(shifted.downcast_ref::<u8>(), Some(&7));
            assert!(shift_positional(id).is_none());
            assert_eq!(depth(id), 2);
        }
        assert!(named_override(id, "x").is_some());
        let _a = WithGuard::push(id, Parameters::default(), 2).unwrap();
        assert!(matches!(
            WithGuard::push(id, Parameters::default(), 2),
            Err(DiError::DepthExceeded(2))
        ));
    }
}
