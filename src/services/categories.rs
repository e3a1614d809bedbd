//! Category listings

use tokio_util::sync::CancellationToken;

use super::finish;
use crate::client::XtreamClient;
use crate::error::Result;
use crate::models::Category;
use crate::options::{RequestOption, RequestOptions};

pub struct CategoryService<'a> {
    client: &'a XtreamClient,
}

impl XtreamClient {
    pub fn categories(&self) -> CategoryService<'_> {
        CategoryService { client: self }
    }
}

impl<'a> CategoryService<'a> {
    pub async fn live<I>(&self, ctx: &CancellationToken, options: I) -> Result<Vec<Category>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.list(ctx, "get_live_categories", options).await
    }

    pub async fn vod<I>(&self, ctx: &CancellationToken, options: I) -> Result<Vec<Category>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.list(ctx, "get_vod_categories", options).await
    }

    pub async fn series<I>(&self, ctx: &CancellationToken, options: I) -> Result<Vec<Category>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        self.list(ctx, "get_series_categories", options).await
    }

    // Category listings take no upstream parameters; the category scope is ignored
    async fn list<I>(&self, ctx: &CancellationToken, action: &str, options: I) -> Result<Vec<Category>>
    where
        I: IntoIterator<Item = RequestOption>,
    {
        let options = RequestOptions::build(options);
        let categories: Vec<Category> = self.client.execute(ctx, action, &[]).await?;
        finish(categories, &options)
    }
}
