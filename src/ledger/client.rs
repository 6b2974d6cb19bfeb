use std::time::Duration;

use reqwest::{Client, Url};

use crate::error::{MeshError, Result};
use crate::ledger::query::{CountResponse, LedgerQuery, ProductTally, QueryAnswer, SellerTally};
use crate::ledger::Sale;

/// Calls the ledger routes of the current server peer.
#[derive(Debug, Clone)]
pub struct LedgerClient {
    client: Client,
    host: String,
}

impl LedgerClient {
    pub fn new(host: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            host: host.into(),
        })
    }

    /// Each segment is percent-encoded on its own, so ids holding `/`, `?`
    /// or `#` stay inside their segment.
    fn url<S: AsRef<str>>(&self, port: u16, segments: &[S]) -> Result<Url> {
        let base = format!("http://{}:{}/", self.host, port);
        let mut url =
            Url::parse(&base).map_err(|e| MeshError::InvalidUrl(format!("{base}: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| MeshError::InvalidUrl(base.clone()))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    /// `POST /create` on the server at `port`.
    pub async fn submit_sale(&self, port: u16, sale: &Sale) -> Result<()> {
        self.client
            .post(self.url(port, &["create"])?)
            .json(sale)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    pub async fn query(&self, port: u16, query: &LedgerQuery) -> Result<QueryAnswer> {
        let response = self
            .client
            .get(self.url(port, &query.segments())?)
            .send()
            .await?
            .error_for_status()?;

        let answer = match query {
            LedgerQuery::BestSeller => {
                QueryAnswer::BestSeller(response.json::<Option<SellerTally>>().await?)
            }
            LedgerQuery::BestProduct => {
                QueryAnswer::BestProduct(response.json::<Option<ProductTally>>().await?)
            }
            LedgerQuery::TotalBySeller { .. }
            | LedgerQuery::TotalByProduct { .. }
            | LedgerQuery::TotalByRange { .. } => {
                QueryAnswer::Count(response.json::<CountResponse>().await?)
            }
        };
        Ok(answer)
    }
}
