//! Class catalog client
//!
//! Fetches the studio's schedule page for one date and hands it to
//! [`ScheduleParser`]. There is no retry here; the scheduler simply tries
//! again on its next tick.

use async_trait::async_trait;

use crate::models::ClassSlot;
use crate::parser::ScheduleParser;
use crate::platform::Platform;
use crate::utils::error::FetchError;

const CATALOG_PATH: &str = "/classic/mainclass";

/// Fixed query parameters of the schedule page
const CATALOG_PARAMS: [(&str, &str); 18] = [
    ("tg", ""),
    ("vt", ""),
    ("lvl", ""),
    ("stype", ""),
    ("view", ""),
    ("trn", "0"),
    ("page", ""),
    ("catid", ""),
    ("prodid", ""),
    ("classid", "0"),
    ("prodGroupId", ""),
    ("sSU", ""),
    ("optForwardingLink", ""),
    ("qParam", ""),
    ("justloggedin", ""),
    ("nLgIn", ""),
    ("pMode", "0"),
    ("loc", "1"),
];

/// Source of class catalogs
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every class slot listed for `date` (`MM/DD/YYYY`)
    async fn fetch_catalog(&self, date: &str) -> Result<Vec<ClassSlot>, FetchError>;
}

/// Catalog client backed by the platform's schedule page
pub struct ScheduleClient {
    platform: Platform,
    parser: ScheduleParser,
}

impl ScheduleClient {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            parser: ScheduleParser::new(),
        }
    }

    /// Fetch the raw schedule page for `date`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Status` for non-success responses and
    /// `FetchError::Timeout` / `FetchError::Http` for transport failures
    pub async fn fetch_page(&self, date: &str) -> Result<String, FetchError> {
        let (client, status) = self
            .platform
            .open_session()
            .await
            .map_err(FetchError::from_transport)?;
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let response = client
            .get(self.platform.url(CATALOG_PATH))
            .query(&[("studioid", self.platform.studio_id().to_string())])
            .query(&[("date", date)])
            .query(&CATALOG_PARAMS)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        response.text().await.map_err(FetchError::from_transport)
    }
}

#[async_trait]
impl CatalogSource for ScheduleClient {
    async fn fetch_catalog(&self, date: &str) -> Result<Vec<ClassSlot>, FetchError> {
        let html = self.fetch_page(date).await?;
        let slots = self.parser.parse(&html, date)?;

        tracing::info!(
            date,
            slots = slots.len(),
            bookable = slots.iter().filter(|s| s.is_bookable()).count(),
            "Fetched class catalog"
        );
        Ok(slots)
    }
}
