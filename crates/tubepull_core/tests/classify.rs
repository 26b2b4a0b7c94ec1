use tubepull_core::{classify, RequestMode, UrlValidation, ValidationFailure};

const MODES: [RequestMode; 2] = [RequestMode::Single, RequestMode::Collection];

#[test]
fn blank_input_is_not_yet_judged() {
    for mode in MODES {
        assert_eq!(classify("", mode), UrlValidation::ok());
        assert_eq!(classify("   \t", mode), UrlValidation::ok());
    }
}

#[test]
fn unrecognized_hosts_are_invalid_in_every_mode() {
    let urls = [
        "https://vimeo.com/12345",
        "https://example.com/watch?v=abc&list=PL1",
        "not a url at all",
        "ftp://files.example.org/playlist?list=PL1",
    ];
    for url in urls {
        for mode in MODES {
            assert_eq!(
                classify(url, mode),
                UrlValidation::rejected(ValidationFailure::UnrecognizedUrl),
                "{url} in {mode:?}"
            );
        }
    }
}

#[test]
fn malformed_url_with_known_host_fails_closed() {
    for mode in MODES {
        let verdict = classify("youtube.com/watch?v=abc", mode);
        assert_eq!(verdict.reason, Some(ValidationFailure::UnrecognizedUrl));
    }
}

#[test]
fn single_item_urls_are_valid_only_in_single_mode() {
    let urls = [
        "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtube.com/watch?v=dQw4w9WgXcQ&t=42",
        "https://m.youtube.com/watch?v=dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ",
        "https://youtu.be/dQw4w9WgXcQ?t=10",
    ];
    for url in urls {
        assert!(classify(url, RequestMode::Single).valid, "{url}");
        assert_eq!(
            classify(url, RequestMode::Collection),
            UrlValidation::rejected(ValidationFailure::SingleItemInCollectionMode),
            "{url}"
        );
    }
}

#[test]
fn collection_urls_are_valid_only_in_collection_mode() {
    let urls = [
        "https://www.youtube.com/playlist?list=PLx0sYbCqOb8TBPRdmBHs5Iftvv9TPboYG",
        "https://youtube.com/playlist?list=PL1&si=abc",
        "https://youtu.be/?list=PL1",
    ];
    for url in urls {
        assert!(classify(url, RequestMode::Collection).valid, "{url}");
        assert_eq!(
            classify(url, RequestMode::Single),
            UrlValidation::rejected(ValidationFailure::CollectionInSingleMode),
            "{url}"
        );
    }
}

#[test]
fn item_watched_inside_a_collection_is_accepted_by_both_modes() {
    let url = "https://www.youtube.com/watch?v=abc&list=PL1&index=3";
    assert!(classify(url, RequestMode::Single).valid);
    assert!(classify(url, RequestMode::Collection).valid);
}

#[test]
fn validation_messages_are_human_readable() {
    assert_eq!(
        ValidationFailure::UnrecognizedUrl.to_string(),
        "not a recognized media URL"
    );
    assert_eq!(
        ValidationFailure::CollectionInSingleMode.message(),
        "collection URL used in single-item mode"
    );
    assert_eq!(
        ValidationFailure::SingleItemInCollectionMode.message(),
        "single-item URL used in collection mode"
    );
}
