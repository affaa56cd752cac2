use regex::Regex;
use std::sync::OnceLock;
use uuid::Uuid;

/// Logical prefix every note attachment is stored under.
pub const ATTACHMENT_PREFIX: &str = "notes/";

fn unsafe_filename_regex() -> &'static Regex {
    static UNSAFE_FILENAME_REGEX: OnceLock<Regex> = OnceLock::new();
    UNSAFE_FILENAME_REGEX
        .get_or_init(|| Regex::new(r"[/\\#?%\x00-\x1f\x7f]").expect("valid filename regex"))
}

/// Strip anything that would let a filename leave the attachment prefix.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned = unsafe_filename_regex().replace_all(filename.trim(), "_");
    // ".." alone would still read as a parent segment to some backends
    if cleaned.chars().all(|c| c == '.') {
        return String::new();
    }
    cleaned.into_owned()
}

/// Fresh storage path for an upload: `notes/<uuid>_<filename>`.
pub fn new_attachment_path(filename: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    let safe_name = sanitize_filename(filename);
    if safe_name.is_empty() {
        format!("{}{}", ATTACHMENT_PREFIX, token)
    } else {
        format!("{}{}_{}", ATTACHMENT_PREFIX, token, safe_name)
    }
}

pub fn is_attachment_path(path: &str) -> bool {
    path.strip_prefix(ATTACHMENT_PREFIX)
        .is_some_and(|rest| !rest.is_empty())
}
