//! Server-Sent-Event framing for fragment streams

use std::pin::Pin;

use futures::{StreamExt, stream};
use recon_wire::Fragment;
use tokio_stream::Stream;

/// Frame sent after the last fragment of a turn
pub const DONE_FRAME: &str = "data: [DONE]\n\n";

/// Render one fragment as an SSE `data:` frame
pub fn sse_frame(fragment: &Fragment) -> String {
    let payload = serde_json::json!({ "content": fragment.to_string() });
    format!("data: {payload}\n\n")
}

/// Wrap a fragment stream as SSE frames terminated by [`DONE_FRAME`]
pub fn into_sse<S>(fragments: S) -> Pin<Box<dyn Stream<Item = String> + Send>>
where
    S: Stream<Item = Fragment> + Send + 'static,
{
    Box::pin(
        fragments
            .map(|fragment| sse_frame(&fragment))
            .chain(stream::once(async { DONE_FRAME.to_string() })),
    )
}
