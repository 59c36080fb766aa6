pub(super) fn bind() -> String {
    String::from("0.0.0.0:8080")
}

pub(super) fn log_level() -> String {
    String::from("info")
}

pub(super) fn min_reviews_required() -> u32 {
    1
}

pub(super) fn empty_string() -> String {
    String::new()
}

pub(super) fn api_url() -> String {
    String::from("https://api.github.com")
}
