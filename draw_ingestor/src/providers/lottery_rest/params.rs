use crate::models::date_range::{DATE_FORMAT, DateRange};

/// Query string for the `draws` listing endpoint.
pub fn construct_range_params(range: &DateRange, page_token: Option<&str>) -> Vec<(String, String)> {
    let mut query = vec![
        ("since".to_string(), range.since().format(DATE_FORMAT).to_string()),
        ("till".to_string(), range.till().format(DATE_FORMAT).to_string()),
    ];
    if let Some(token) = page_token {
        query.push(("page_token".to_string(), token.to_string()));
    }
    query
}
