//! Process-wide default registry and the convenience entry points over it.
//!
//! The default is installed once with [`install`] before serving, or built
//! lazily from the built-in codecs on first use. It is never replaced.
//! Request-scoped entry points use the registry installed for the request by
//! the render middleware, falling back to the default.

use std::sync::{Arc, OnceLock};

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::decoders::DecodeFn;
use crate::encoders::{EncodeFn, Encodable};
use crate::http::{RequestContext, ResponseWriter};
use crate::negotiation::{ContentType, ContentTypeSet};
use crate::stream::EventStream;
use crate::walk::{BindNode, RenderNode, WalkError};

use super::{BindError, Registry, RegistryError};

static GLOBAL: OnceLock<Arc<Registry>> = OnceLock::new();

/// Install `registry` as the process-wide default.
///
/// Fails once a default exists, including one created lazily by an earlier
/// call to [`global`].
pub fn install(registry: Registry) -> Result<Arc<Registry>, RegistryError> {
    let registry = Arc::new(registry);
    GLOBAL
        .set(Arc::clone(&registry))
        .map_err(|_| RegistryError::AlreadyInstalled)?;
    tracing::info!(
        encoders = registry.supported_encoders().len(),
        decoders = registry.supported_decoders().len(),
        default_response = %registry.default_response(),
        "default registry installed"
    );
    Ok(registry)
}

pub fn global() -> Arc<Registry> {
    Arc::clone(GLOBAL.get_or_init(|| Arc::new(Registry::new())))
}

/// Decode and bind the request body with the request's registry.
pub fn bind<T>(ctx: &RequestContext, body: &[u8]) -> Result<T, BindError>
where
    T: DeserializeOwned + BindNode,
{
    ctx.registry().bind(ctx, body)
}

/// Render a payload with the request's registry.
pub fn render<T>(w: &mut ResponseWriter, ctx: &RequestContext, payload: &mut T) -> Result<(), WalkError>
where
    T: RenderNode + Encodable,
{
    ctx.registry().render(w, ctx, payload)
}

pub fn render_list<T>(w: &mut ResponseWriter, ctx: &RequestContext, items: &mut [T]) -> Result<(), WalkError>
where
    T: RenderNode + Serialize,
{
    ctx.registry().render_list(w, ctx, items)
}

pub async fn render_stream(w: &mut ResponseWriter, ctx: &RequestContext, events: EventStream) {
    ctx.registry().render_stream(w, ctx, events).await;
}

/// Status hint applied by the encoder that writes the response.
pub fn status(ctx: &RequestContext, status: StatusCode) {
    ctx.set_status(status);
}

pub fn set_encoder(ct: impl Into<ContentType>, encoder: Option<EncodeFn>) -> Result<(), RegistryError> {
    global().set_encoder(ct, encoder)
}

pub fn set_decoder(ct: impl Into<ContentType>, decoder: Option<DecodeFn>) -> Result<(), RegistryError> {
    global().set_decoder(ct, decoder)
}

pub fn supported_encoders() -> ContentTypeSet {
    global().supported_encoders()
}

pub fn supported_decoders() -> ContentTypeSet {
    global().supported_decoders()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&global(), &global()));
        assert!(supported_encoders().has(&ContentType::JSON));
        assert!(supported_decoders().has(&ContentType::FORM));
    }

    #[test]
    fn test_second_install_refused() {
        global();
        let err = install(Registry::new()).unwrap_err();
        assert_eq!(err, RegistryError::AlreadyInstalled);
    }

    #[test]
    fn test_status_sets_hint() {
        let ctx = RequestContext::from(&Request::builder().body(()).unwrap());
        status(&ctx, StatusCode::CREATED);
        assert_eq!(ctx.status_hint(), Some(StatusCode::CREATED));
    }

    #[test]
    fn test_clone_default_is_detached() {
        let copy = Registry::clone_default();
        copy.set_encoder("application/detached", None).unwrap();
        copy.set_default_request(ContentType::XML).unwrap();
        assert_eq!(global().default_request(), ContentType::NONE);
    }
}
