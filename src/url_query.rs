//! URL preprocessor: extracts the decoded SQuery text and the root entity
//! from a request URL.
//!
//! The root entity comes from the `QueryRootEntityType` query parameter;
//! when absent, the last non-empty path segment is used (the REST routes
//! of the identity-management product end in the entity name).
//! `url::Url::query_pairs` applies application/x-www-form-urlencoded
//! decoding, so `+` becomes a space inside `squery`.

use url::Url;

use crate::error::TranslateError;

/// A preprocessed translation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    pub squery: String,
    pub root_entity: String,
}

/// Extract `(squery, root_entity)` from a full request URL.
pub fn parse_request(url: &str) -> Result<QueryRequest, TranslateError> {
    let parsed = Url::parse(url).map_err(|e| TranslateError::UrlParseError {
        url: url.to_string(),
        source: e,
    })?;

    let mut squery = String::new();
    let mut root_entity: Option<String> = None;
    for (key, value) in parsed.query_pairs() {
        match key.as_ref() {
            "squery" => squery = value.into_owned(),
            "QueryRootEntityType" => root_entity = Some(value.into_owned()),
            _ => {}
        }
    }

    let root_entity = root_entity
        .filter(|entity| !entity.is_empty())
        .or_else(|| {
            parsed.path_segments().and_then(|segments| {
                segments
                    .filter(|segment| !segment.is_empty())
                    .last()
                    .map(str::to_string)
            })
        })
        .filter(|entity| !entity.is_empty())
        .ok_or_else(|| TranslateError::MissingRootEntity {
            url: url.to_string(),
        })?;

    Ok(QueryRequest {
        squery,
        root_entity,
    })
}
