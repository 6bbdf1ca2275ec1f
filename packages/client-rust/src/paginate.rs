//! Page walker for panel list endpoints.
//!
//! The panel embeds its only termination signal in each response body
//! (`meta.pagination.current_page` / `total_pages`), so pagination is
//! strictly sequential: page N+1 cannot be requested until page N's metadata
//! has been read. Record order is preserved exactly as returned.

use serde::de::DeserializeOwned;
use tracing::{error, warn};

use roost_core::envelope::{ListDocument, Pagination};

use crate::gateway::{ApiRequest, Gateway};

/// Walks every page of a list endpoint, accumulating attribute records.
///
/// A non-200 page stops the walk and returns whatever was accumulated --
/// partial results are acceptable, not an error. Responses without a
/// pagination block (embedded-style lists) are treated as a single page.
/// `page_cap` bounds the walk against a backend whose cursor never advances.
pub async fn paginate<T: DeserializeOwned>(
    gateway: &dyn Gateway,
    path: &str,
    query: &[(&str, &str)],
    page_cap: u32,
) -> Vec<T> {
    let mut records = Vec::new();
    let mut page: u32 = 1;

    loop {
        let mut request = ApiRequest::get(path);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        request = request.query("page", page.to_string());

        let response = gateway.send(request).await;
        if response.status != 200 {
            warn!(
                endpoint = %gateway.endpoint(),
                path,
                page,
                status = response.status,
                body = %response.body,
                "pagination stopped, returning partial results",
            );
            break;
        }

        let document: ListDocument<T> = match response.json() {
            Ok(document) => document,
            Err(e) => {
                error!(endpoint = %gateway.endpoint(), path, page, error = %e, "malformed list page");
                break;
            }
        };

        let last_page = document.pagination().is_none_or(Pagination::is_last_page);
        records.extend(document.into_records());

        if last_page {
            break;
        }
        if page >= page_cap {
            warn!(
                endpoint = %gateway.endpoint(),
                path,
                page_cap,
                "pagination cap reached before backend reported the last page",
            );
            break;
        }
        page += 1;
    }

    records
}
