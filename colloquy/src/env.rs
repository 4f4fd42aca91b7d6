use std::{fmt, sync::Arc};

use crate::Protocol;

/// The stack of loops enclosing a [`Chan`](crate::Chan)'s current position in its protocol,
/// innermost first.
///
/// Entering a [`Loop`](Protocol::Loop) pushes the loop; each [`resume`](crate::Chan::resume) of a
/// [`Continue`](Protocol::Continue) pops one level. Environments are persistent: pushing and
/// popping return new environments and leave the original untouched, sharing structure with it.
#[derive(Clone, Default)]
pub struct Environment {
    innermost: Option<Arc<Frame>>,
    depth: usize,
}

struct Frame {
    looped: Arc<Protocol>,
    outer: Environment,
}

impl Environment {
    /// The empty environment, outside of any loop.
    pub fn new() -> Environment {
        Environment::default()
    }

    /// The environment inside `looped`, which must be a [`Loop`](Protocol::Loop), when entered from
    /// this environment.
    pub fn push(&self, looped: Arc<Protocol>) -> Environment {
        debug_assert!(
            matches!(*looped, Protocol::Loop(_)),
            "only loops are pushed onto an environment"
        );
        Environment {
            innermost: Some(Arc::new(Frame {
                looped,
                outer: self.clone(),
            })),
            depth: self.depth + 1,
        }
    }

    /// Split this environment into its innermost loop and the environment enclosing that loop, or
    /// return `None` if no loop encloses this environment.
    pub fn pop(&self) -> Option<(Arc<Protocol>, Environment)> {
        self.innermost
            .as_ref()
            .map(|frame| (frame.looped.clone(), frame.outer.clone()))
    }

    /// The number of loops enclosing this environment.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Is this environment outside of any loop?
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Iterate over the enclosing loops, innermost first.
    pub fn loops(&self) -> impl Iterator<Item = &Arc<Protocol>> + '_ {
        let mut next = self.innermost.as_deref();
        std::iter::from_fn(move || {
            let frame = next?;
            next = frame.outer.innermost.as_deref();
            Some(&frame.looped)
        })
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_list()
            .entries(self.loops().map(|looped| looped.to_string()))
            .finish()
    }
}
