// rest_api/src/listing.rs
use axum::http::Uri;
use axum::Json;
use serde::{Deserialize, Serialize};

use simrs_models::{paginate, Listing};

/// `page` switches a list endpoint to the paginated envelope.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
}

/// Path and query of `uri` without the pagination parameters.
fn base_path(uri: &Uri) -> String {
    let kept: Vec<&str> = uri
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| {
            let key = pair.split('=').next().unwrap_or_default();
            key != "page" && key != "page_size"
        })
        .collect();
    if kept.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), kept.join("&"))
    }
}

/// A bare array, or a `{results, count, next, previous}` page when `page`
/// was requested.
pub fn listing<T: Serialize>(items: Vec<T>, params: PageParams, default_page_size: usize, uri: &Uri) -> Json<Listing<T>> {
    match params.page {
        None => Json(Listing::Bare(items)),
        Some(page) => {
            let page_size = params.page_size.unwrap_or(default_page_size);
            Json(Listing::Paginated(paginate(items, page, page_size, &base_path(uri))))
        }
    }
}
