//! Live and VOD stream listings

use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::finish;
use crate::client::XtreamClient;
use crate::error::{Result, XtreamError};
use crate::models::Stream;
use crate::options::{RequestOption, RequestOptions};

pub struct StreamService<'a> {
    client: &'a XtreamClient,
}

impl XtreamClient {
    pub fn streams(&self) -> StreamService<'_> {
        StreamService { client: self }
    }
}

impl<'a> StreamService<'a> {
    /// Get live streams, optionally scoped, filtered and sorted
    pub async fn live<I>(&self, ctx: &CancellationToken, options: I) -> Result<Vec<Stream>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.list(ctx, "get_live_streams", RequestOptions::build(options))
            .await
    }

    /// Get VOD streams, optionally scoped, filtered and sorted
    pub async fn vod<I>(&self, ctx: &CancellationToken, options: I) -> Result<Vec<Stream>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.list(ctx, "get_vod_streams", RequestOptions::build(options))
            .await
    }

    async fn list(
        &self,
        ctx: &CancellationToken,
        action: &str,
        options: RequestOptions,
    ) -> Result<Vec<Stream>> {
        let mut params = Vec::new();
        if let Some(category_id) = options.category_id.as_deref().filter(|c| !c.is_empty()) {
            params.push(("category_id", category_id.to_string()));
        }

        let streams: Vec<Stream> = self.client.execute(ctx, action, &params).await?;
        debug!("{} returned {} streams", action, streams.len());
        finish(streams, &options)
    }

    /// Get metadata for a single stream
    pub async fn info(&self, ctx: &CancellationToken, stream_id: i64) -> Result<Stream> {
        self.client
            .execute(
                ctx,
                "get_stream_info",
                &[("stream_id", stream_id.to_string())],
            )
            .await
    }

    /// Resolve a playable URL, using the stream's type as the path segment
    pub async fn url(
        &self,
        ctx: &CancellationToken,
        stream_id: i64,
        format: &str,
    ) -> Result<String> {
        let stream = self.info(ctx, stream_id).await?;
        if stream.stream_type.is_empty() {
            return Err(XtreamError::Decode(format!(
                "stream {} has no stream_type",
                stream_id
            )));
        }
        Ok(self
            .client
            .stream_url(&stream.stream_type, stream_id, format))
    }
}
