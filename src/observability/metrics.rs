//! Render metrics.
//!
//! # Metrics
//! - `render_responses_total` (counter): responses written, by `content_type`
//! - `render_encoder_fallbacks_total` (counter): encoders that declined a
//!   value, by `content_type`
//! - `render_decodes_total` (counter): request bodies decoded, by
//!   `content_type` and `outcome` (`ok`, `error`, `unsupported`)
//! - `render_stream_frames_total` (counter): SSE frames sent, by `kind`
//! - `render_streams_total` (counter): finished event streams, by `outcome`

pub fn record_negotiated(content_type: &str) {
    ::metrics::counter!("render_responses_total", "content_type" => content_type.to_owned()).increment(1);
}

pub fn record_encoder_fallback(content_type: &str) {
    ::metrics::counter!("render_encoder_fallbacks_total", "content_type" => content_type.to_owned())
        .increment(1);
}

pub fn record_decode(content_type: &str, outcome: &'static str) {
    ::metrics::counter!(
        "render_decodes_total",
        "content_type" => content_type.to_owned(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_stream_frame(kind: &'static str) {
    ::metrics::counter!("render_stream_frames_total", "kind" => kind).increment(1);
}

pub fn record_stream_end(outcome: &'static str) {
    ::metrics::counter!("render_streams_total", "outcome" => outcome).increment(1);
}
