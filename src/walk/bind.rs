//! Bottom-up bind walk.

use crate::errors::BoxError;
use crate::http::RequestContext;

use super::WalkError;

/// A payload that completes itself after the body was decoded into it.
///
/// Children are bound before their parent, so `bind` sees finished children.
pub trait Binder {
    fn bind(&mut self, _r: &RequestContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Visit child nodes in declaration order with [`BindWalk::visit`].
    fn bind_children(&mut self, _walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        Ok(())
    }
}

/// A field-embeddable node that does nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NilBinder;

impl Binder for NilBinder {}

impl<T: Binder + ?Sized> Binder for Box<T> {
    fn bind(&mut self, r: &RequestContext) -> Result<(), BoxError> {
        (**self).bind(r)
    }

    fn bind_children(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        (**self).bind_children(walk)
    }
}

/// Anything that can sit in a child position of a bind walk.
pub trait BindNode {
    fn bind_node(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError>;
}

impl<T: Binder + ?Sized> BindNode for T {
    fn bind_node(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        self.bind_children(walk)?;
        walk.visited += 1;
        self.bind(walk.r).map_err(|source| WalkError::Bind {
            node: std::any::type_name::<T>(),
            source,
        })
    }
}

impl<T: BindNode> BindNode for Option<T> {
    fn bind_node(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        match self {
            Some(inner) => inner.bind_node(walk),
            None => Ok(()),
        }
    }
}

impl<T: BindNode> BindNode for Vec<T> {
    fn bind_node(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        self.iter_mut().try_for_each(|item| item.bind_node(walk))
    }
}

impl<T: BindNode, const N: usize> BindNode for [T; N] {
    fn bind_node(&mut self, walk: &mut BindWalk<'_>) -> Result<(), WalkError> {
        self.iter_mut().try_for_each(|item| item.bind_node(walk))
    }
}

/// State of one bind walk.
pub struct BindWalk<'a> {
    r: &'a RequestContext,
    visited: usize,
}

impl<'a> BindWalk<'a> {
    pub fn new(r: &'a RequestContext) -> Self {
        Self { r, visited: 0 }
    }

    /// Bind the children of `node`, then `node` itself.
    pub fn visit<N: BindNode + ?Sized>(&mut self, node: &mut N) -> Result<(), WalkError> {
        node.bind_node(self)
    }

    pub fn visited(&self) -> usize {
        self.visited
    }
}

/// Run bind hooks over the tree rooted at `node`, children before parents.
pub fn bind<N: BindNode + ?Sized>(r: &RequestContext, node: &mut N) -> Result<usize, WalkError> {
    let mut walk = BindWalk::new(r);
    walk.visit(node)?;
    Ok(walk.visited())
}
