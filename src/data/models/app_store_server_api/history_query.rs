//! Query parameters for the paginated history endpoints.

use chrono::{DateTime, Utc};
use reqwest::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductType {
    AutoRenewable,
    NonRenewable,
    Consumable,
    NonConsumable,
}

impl ProductType {
    fn as_query_value(&self) -> &'static str {
        match self {
            ProductType::AutoRenewable => "AUTO_RENEWABLE",
            ProductType::NonRenewable => "NON_RENEWABLE",
            ProductType::Consumable => "CONSUMABLE",
            ProductType::NonConsumable => "NON_CONSUMABLE",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// https://developer.apple.com/documentation/appstoreserverapi/get_transaction_history
#[derive(Debug, Clone, Default)]
pub struct TransactionHistoryQuery {
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    revision: Option<String>,
    product_ids: Vec<String>,
    product_types: Vec<ProductType>,
    exclude_revoked: Option<bool>,
    sort: Option<SortOrder>,
}

impl TransactionHistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_start_date(mut self, start_date: DateTime<Utc>) -> Self {
        self.start_date = Some(start_date);
        self
    }

    pub fn with_end_date(mut self, end_date: DateTime<Utc>) -> Self {
        self.end_date = Some(end_date);
        self
    }

    /// Continue from the `revision` of a previous page.
    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.to_owned());
        self
    }

    pub fn with_product_ids<I, S>(mut self, product_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.product_ids.extend(product_ids.into_iter().map(Into::into));
        self
    }

    pub fn with_product_types(mut self, product_types: impl IntoIterator<Item = ProductType>) -> Self {
        self.product_types.extend(product_types);
        self
    }

    pub fn with_exclude_revoked(mut self, exclude_revoked: bool) -> Self {
        self.exclude_revoked = Some(exclude_revoked);
        self
    }

    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = Some(sort);
        self
    }

    pub(crate) fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(start_date) = self.start_date {
            pairs.append_pair("startDate", &start_date.timestamp_millis().to_string());
        }
        if let Some(end_date) = self.end_date {
            pairs.append_pair("endDate", &end_date.timestamp_millis().to_string());
        }
        if let Some(revision) = &self.revision {
            pairs.append_pair("revision", revision);
        }
        for product_id in &self.product_ids {
            pairs.append_pair("productId", product_id);
        }
        for product_type in &self.product_types {
            pairs.append_pair("productType", product_type.as_query_value());
        }
        if let Some(exclude_revoked) = self.exclude_revoked {
            pairs.append_pair("excludeRevoked", if exclude_revoked { "true" } else { "false" });
        }
        if let Some(sort) = self.sort {
            let value = match sort {
                SortOrder::Ascending => "ASCENDING",
                SortOrder::Descending => "DESCENDING",
            };
            pairs.append_pair("sort", value);
        }
        drop(pairs);
        strip_empty_query(url);
    }
}

/// https://developer.apple.com/documentation/appstoreserverapi/get_refund_history
#[derive(Debug, Clone, Default)]
pub struct RefundHistoryQuery {
    revision: Option<String>,
}

impl RefundHistoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_revision(mut self, revision: &str) -> Self {
        self.revision = Some(revision.to_owned());
        self
    }

    pub(crate) fn apply(&self, url: &mut Url) {
        if let Some(revision) = &self.revision {
            url.query_pairs_mut().append_pair("revision", revision);
        }
    }
}

/// `query_pairs_mut` leaves a bare `?` behind when nothing was appended.
fn strip_empty_query(url: &mut Url) {
    if url.query() == Some("") {
        url.set_query(None);
    }
}
