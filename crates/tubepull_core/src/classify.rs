use std::fmt;

use url::Url;

const LONG_FORM_HOST: &str = "youtube.com";
const SHORT_FORM_HOST: &str = "youtu.be";
const ITEM_PARAM: &str = "v";
const COLLECTION_PARAM: &str = "list";
const ITEM_VIEW_PATH: &str = "watch";
const COLLECTION_VIEW_PATH: &str = "playlist";

/// Which kind of job the user asked for. Selects the classifier rule and the
/// initiation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    #[default]
    Single,
    Collection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    UnrecognizedUrl,
    CollectionInSingleMode,
    SingleItemInCollectionMode,
}

impl ValidationFailure {
    pub fn message(self) -> &'static str {
        match self {
            ValidationFailure::UnrecognizedUrl => "not a recognized media URL",
            ValidationFailure::CollectionInSingleMode => "collection URL used in single-item mode",
            ValidationFailure::SingleItemInCollectionMode => {
                "single-item URL used in collection mode"
            }
        }
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UrlValidation {
    pub valid: bool,
    pub reason: Option<ValidationFailure>,
}

impl UrlValidation {
    pub const fn ok() -> Self {
        Self {
            valid: true,
            reason: None,
        }
    }

    pub const fn rejected(reason: ValidationFailure) -> Self {
        Self {
            valid: false,
            reason: Some(reason),
        }
    }
}

impl Default for UrlValidation {
    fn default() -> Self {
        Self::ok()
    }
}

/// Validate `url` against the selected `mode`.
///
/// Blank input is "not yet judged" and therefore valid. Anything that cannot
/// be parsed fails closed as an unrecognized URL.
pub fn classify(url: &str, mode: RequestMode) -> UrlValidation {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return UrlValidation::ok();
    }
    if !trimmed.contains(LONG_FORM_HOST) && !trimmed.contains(SHORT_FORM_HOST) {
        return UrlValidation::rejected(ValidationFailure::UnrecognizedUrl);
    }
    let Ok(parsed) = Url::parse(trimmed) else {
        return UrlValidation::rejected(ValidationFailure::UnrecognizedUrl);
    };

    let collection = is_collection_reference(&parsed);
    match mode {
        RequestMode::Single if collection && !is_single_item_reference(&parsed) => {
            UrlValidation::rejected(ValidationFailure::CollectionInSingleMode)
        }
        RequestMode::Collection if !collection => {
            UrlValidation::rejected(ValidationFailure::SingleItemInCollectionMode)
        }
        _ => UrlValidation::ok(),
    }
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.into_owned())
}

fn is_collection_reference(url: &Url) -> bool {
    match query_value(url, COLLECTION_PARAM) {
        Some(list) => url.path().contains(COLLECTION_VIEW_PATH) || !list.is_empty(),
        None => false,
    }
}

fn is_single_item_reference(url: &Url) -> bool {
    let host = url.host_str().unwrap_or_default();
    let has_collection = query_value(url, COLLECTION_PARAM).is_some();

    if host.contains(LONG_FORM_HOST) {
        let has_item = query_value(url, ITEM_PARAM).is_some_and(|id| !id.is_empty());
        return has_item && (!has_collection || url.path().contains(ITEM_VIEW_PATH));
    }
    if host.contains(SHORT_FORM_HOST) {
        return !has_collection;
    }
    false
}
