//! EPG lookups
//!
//! EPG entries are returned as the server sends them; no filtering or sorting.

use tokio_util::sync::CancellationToken;

use crate::client::XtreamClient;
use crate::error::Result;
use crate::models::{EpgEntry, EpgListings};

pub struct EpgService<'a> {
    client: &'a XtreamClient,
}

impl XtreamClient {
    pub fn epg(&self) -> EpgService<'_> {
        EpgService { client: self }
    }
}

impl<'a> EpgService<'a> {
    /// Get short EPG for a stream (next few programmes)
    pub async fn short(
        &self,
        ctx: &CancellationToken,
        stream_id: i64,
        limit: Option<usize>,
    ) -> Result<Vec<EpgEntry>> {
        let mut params = vec![("stream_id", stream_id.to_string())];
        if let Some(limit) = limit.filter(|l| *l > 0) {
            params.push(("limit", limit.to_string()));
        }

        let listings: EpgListings = self.client.execute(ctx, "get_short_epg", &params).await?;
        Ok(listings.epg_listings)
    }

    /// Get the full EPG table for a stream
    pub async fn full(&self, ctx: &CancellationToken, stream_id: i64) -> Result<Vec<EpgEntry>> {
        let listings: EpgListings = self
            .client
            .execute(
                ctx,
                "get_simple_data_table",
                &[("stream_id", stream_id.to_string())],
            )
            .await?;
        Ok(listings.epg_listings)
    }

    /// Raw XMLTV export
    pub async fn xmltv(&self, ctx: &CancellationToken) -> Result<Vec<u8>> {
        self.client.fetch_xmltv(ctx).await
    }
}
