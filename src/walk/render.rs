//! Top-down render walk.

use crate::errors::BoxError;
use crate::http::{RequestContext, ResponseWriter};

use super::WalkError;

/// A payload that prepares itself before being encoded.
///
/// `render` may set headers and the status hint but must not write the body;
/// the encoder owns the body. Both hooks default to no-ops.
pub trait Renderer {
    fn render(&mut self, _w: &mut ResponseWriter, _r: &RequestContext) -> Result<(), BoxError> {
        Ok(())
    }

    /// Visit child nodes in declaration order with [`RenderWalk::visit`].
    fn render_children(&mut self, _walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        Ok(())
    }
}

/// A field-embeddable node that does nothing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NilRender;

impl Renderer for NilRender {}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn render(&mut self, w: &mut ResponseWriter, r: &RequestContext) -> Result<(), BoxError> {
        (**self).render(w, r)
    }

    fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        (**self).render_children(walk)
    }
}

/// Anything that can sit in a child position of a render walk.
pub trait RenderNode {
    fn render_node(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError>;
}

impl<T: Renderer + ?Sized> RenderNode for T {
    fn render_node(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        walk.visited += 1;
        self.render(walk.w, walk.r)
            .map_err(|source| WalkError::Render {
                node: std::any::type_name::<T>(),
                source,
            })?;
        self.render_children(walk)
    }
}

impl<T: RenderNode> RenderNode for Option<T> {
    fn render_node(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        match self {
            Some(inner) => inner.render_node(walk),
            None => Ok(()),
        }
    }
}

impl<T: RenderNode> RenderNode for Vec<T> {
    fn render_node(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        self.iter_mut().try_for_each(|item| item.render_node(walk))
    }
}

impl<T: RenderNode, const N: usize> RenderNode for [T; N] {
    fn render_node(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
        self.iter_mut().try_for_each(|item| item.render_node(walk))
    }
}

/// State of one render walk.
pub struct RenderWalk<'a> {
    w: &'a mut ResponseWriter,
    r: &'a RequestContext,
    visited: usize,
}

impl<'a> RenderWalk<'a> {
    pub fn new(w: &'a mut ResponseWriter, r: &'a RequestContext) -> Self {
        Self { w, r, visited: 0 }
    }

    /// Render `node`, then its children.
    pub fn visit<N: RenderNode + ?Sized>(&mut self, node: &mut N) -> Result<(), WalkError> {
        node.render_node(self)
    }

    /// Number of hooks invoked so far.
    pub fn visited(&self) -> usize {
        self.visited
    }
}

/// Run render hooks over the tree rooted at `node`, parents before children.
///
/// Returns how many nodes were visited.
pub fn render<N: RenderNode + ?Sized>(
    w: &mut ResponseWriter,
    r: &RequestContext,
    node: &mut N,
) -> Result<usize, WalkError> {
    let mut walk = RenderWalk::new(w, r);
    walk.visit(node)?;
    Ok(walk.visited())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::HeaderValue;
    use axum::http::Request;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<&'static str>>>;

    fn ctx() -> RequestContext {
        RequestContext::from(&Request::builder().body(()).unwrap())
    }

    struct Named {
        name: &'static str,
        log: Log,
    }

    impl Renderer for Named {
        fn render(&mut self, _w: &mut ResponseWriter, _r: &RequestContext) -> Result<(), BoxError> {
            self.log.borrow_mut().push(self.name);
            Ok(())
        }
    }

    struct Parent {
        log: Log,
        first: Option<Named>,
        missing: Option<Named>,
        list: Vec<Named>,
        boxed: Box<dyn Renderer>,
    }

    impl Renderer for Parent {
        fn render(&mut self, w: &mut ResponseWriter, _r: &RequestContext) -> Result<(), BoxError> {
            self.log.borrow_mut().push("parent");
            w.headers_mut().insert("x-rendered", HeaderValue::from_static("yes"));
            Ok(())
        }

        fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
            walk.visit(&mut self.first)?;
            walk.visit(&mut self.missing)?;
            walk.visit(&mut self.list)?;
            walk.visit(&mut self.boxed)
        }
    }

    fn named(name: &'static str, log: &Log) -> Named {
        Named {
            name,
            log: Rc::clone(log),
        }
    }

    #[test]
    fn test_top_down_order() {
        let log: Log = Rc::default();
        let mut payload = Parent {
            log: Rc::clone(&log),
            first: Some(named("first", &log)),
            missing: None,
            list: vec![named("a", &log), named("b", &log)],
            boxed: Box::new(named("boxed", &log)),
        };

        let mut w = ResponseWriter::new();
        let visited = render(&mut w, &ctx(), &mut payload).unwrap();

        assert_eq!(*log.borrow(), ["parent", "first", "a", "b", "boxed"]);
        assert_eq!(visited, 5);
        assert_eq!(w.headers()["x-rendered"], "yes");
        assert!(w.body().is_empty());
    }

    #[test]
    fn test_single_hook_with_nil_fields() {
        struct Counted {
            calls: usize,
            child: Option<Box<Counted>>,
        }

        impl Renderer for Counted {
            fn render(&mut self, _: &mut ResponseWriter, _: &RequestContext) -> Result<(), BoxError> {
                self.calls += 1;
                Ok(())
            }

            fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
                walk.visit(&mut self.child)
            }
        }

        let mut payload = Counted { calls: 0, child: None };
        let visited = render(&mut ResponseWriter::new(), &ctx(), &mut payload).unwrap();
        assert_eq!(payload.calls, 1);
        assert_eq!(visited, 1);
    }

    #[test]
    fn test_noop_embed_with_private_field() {
        struct Embeds {
            _nil: NilRender,
            _secret: u64,
        }

        impl Renderer for Embeds {}

        let mut payload = Embeds {
            _nil: NilRender,
            _secret: 7,
        };
        assert!(render(&mut ResponseWriter::new(), &ctx(), &mut payload).is_ok());
    }

    #[test]
    fn test_noop_embed_with_private_struct_field() {
        struct Opaque {
            _counter: u64,
        }

        struct Embeds {
            nil: NilRender,
            _inner: Opaque,
        }

        impl Renderer for Embeds {
            fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
                walk.visit(&mut self.nil)
            }
        }

        let mut payload = Embeds {
            nil: NilRender,
            _inner: Opaque { _counter: 3 },
        };
        let mut w = ResponseWriter::new();
        assert_eq!(render(&mut w, &ctx(), &mut payload).unwrap(), 2);
        assert!(w.headers().is_empty());
    }

    #[test]
    fn test_empty_list_and_absent_boxed_child() {
        struct Sparse {
            calls: usize,
            items: Vec<Box<dyn Renderer>>,
            extra: Option<Box<dyn Renderer>>,
        }

        impl Renderer for Sparse {
            fn render(&mut self, _: &mut ResponseWriter, _: &RequestContext) -> Result<(), BoxError> {
                self.calls += 1;
                Ok(())
            }

            fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
                walk.visit(&mut self.items)?;
                walk.visit(&mut self.extra)
            }
        }

        let mut payload = Sparse {
            calls: 0,
            items: Vec::new(),
            extra: None,
        };
        assert_eq!(render(&mut ResponseWriter::new(), &ctx(), &mut payload).unwrap(), 1);
        assert_eq!(payload.calls, 1);

        let mut empty: Vec<Named> = Vec::new();
        assert_eq!(render(&mut ResponseWriter::new(), &ctx(), &mut empty).unwrap(), 0);
    }

    #[test]
    fn test_first_error_aborts() {
        struct Failing;

        impl Renderer for Failing {
            fn render(&mut self, _: &mut ResponseWriter, _: &RequestContext) -> Result<(), BoxError> {
                Err("boom".into())
            }
        }

        struct Holder {
            items: Vec<Box<dyn Renderer>>,
        }

        impl Renderer for Holder {
            fn render_children(&mut self, walk: &mut RenderWalk<'_>) -> Result<(), WalkError> {
                walk.visit(&mut self.items)
            }
        }

        let log: Log = Rc::default();
        let mut payload = Holder {
            items: vec![
                Box::new(named("before", &log)),
                Box::new(Failing),
                Box::new(named("after", &log)),
            ],
        };

        let err = render(&mut ResponseWriter::new(), &ctx(), &mut payload).unwrap_err();
        assert_eq!(err.cause().to_string(), "boom");
        assert!(matches!(err, WalkError::Render { .. }));
        assert_eq!(*log.borrow(), ["before"]);
    }

    #[test]
    fn test_arrays_and_optional_elements() {
        let log: Log = Rc::default();
        let mut items = [Some(named("x", &log)), None, Some(named("y", &log))];
        let visited = render(&mut ResponseWriter::new(), &ctx(), &mut items).unwrap();
        assert_eq!(visited, 2);
        assert_eq!(*log.borrow(), ["x", "y"]);
    }
}
