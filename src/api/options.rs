use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::{header, request::Parts, HeaderMap},
};

use crate::api::error::ApiError;
use crate::api::handlers::AppState;
use crate::config::ApiConfig;
use crate::error::Error;
use crate::logic::{parse_bool, FilterSet};
use crate::serializers::RenderOptions;
use crate::store::Store;

/// Query-string switches, filters and pagination, parsed once per request.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub render: RenderOptions,
    pub filters: FilterSet,
    pub limit: usize,
    pub offset: usize,
    path: String,
    /// Raw `key=value` segments other than `limit` and `offset`.
    carried: Vec<String>,
}

#[async_trait]
impl<S> FromRequestParts<AppState<S>> for RequestOptions
where
    S: Store + 'static,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<S>) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map_err(|e| Error::field("non_field_errors", e.body_text()))?;

        Ok(Self::parse(
            pairs,
            &parts.headers,
            parts.uri.path(),
            parts.uri.query(),
            &state.api,
        )?)
    }
}

fn flag(pairs: &[(String, String)], name: &str) -> Result<bool, Error> {
    match pairs.iter().rev().find(|(key, _)| key == name) {
        None => Ok(false),
        Some((_, value)) => parse_bool(value)
            .ok_or_else(|| Error::field(name, format!("\"{}\" is not a valid boolean.", value))),
    }
}

fn number(pairs: &[(String, String)], name: &str) -> Result<Option<usize>, Error> {
    match pairs.iter().rev().find(|(key, _)| key == name) {
        None => Ok(None),
        Some((_, value)) if value.is_empty() => Ok(None),
        Some((_, value)) => value
            .parse()
            .map(Some)
            .map_err(|_| Error::field(name, "A valid integer is required.")),
    }
}

/// `http://<host>` when the client sent a Host header.
fn origin(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(|host| format!("http://{}", host))
}

impl RequestOptions {
    pub fn parse(
        pairs: Vec<(String, String)>,
        headers: &HeaderMap,
        path: &str,
        raw_query: Option<&str>,
        api: &ApiConfig,
    ) -> Result<Self, Error> {
        let render = RenderOptions {
            include_inherited: flag(&pairs, "include_inherited")?,
            brief: flag(&pairs, "brief")?,
            origin: origin(headers),
        };
        let limit = match number(&pairs, "limit")? {
            None | Some(0) => api.default_page_size,
            Some(limit) => limit.min(api.max_page_size),
        };
        let offset = number(&pairs, "offset")?.unwrap_or(0);

        let carried = raw_query
            .unwrap_or_default()
            .split('&')
            .filter(|segment| !segment.is_empty())
            .filter(|segment| !segment.starts_with("limit=") && !segment.starts_with("offset="))
            .map(str::to_string)
            .collect();

        Ok(Self {
            render,
            filters: FilterSet::from_pairs(pairs),
            limit,
            offset,
            path: format!("{}/", path.trim_end_matches('/')),
            carried,
        })
    }

    /// The slice of `items` this request asked for.
    pub fn page<T>(&self, items: Vec<T>) -> Vec<T> {
        items.into_iter().skip(self.offset).take(self.limit).collect()
    }

    fn link(&self, offset: usize) -> String {
        let mut segments = self.carried.clone();
        segments.push(format!("limit={}", self.limit));
        if offset > 0 {
            segments.push(format!("offset={}", offset));
        }
        let path = format!("{}?{}", self.path, segments.join("&"));
        match &self.render.origin {
            Some(origin) => format!("{}{}", origin, path),
            None => path,
        }
    }

    pub fn next_link(&self, count: usize) -> Option<String> {
        let next = self.offset.saturating_add(self.limit);
        (next < count).then(|| self.link(next))
    }

    pub fn previous_link(&self) -> Option<String> {
        (self.offset > 0).then(|| self.link(self.offset.saturating_sub(self.limit)))
    }
}
