use once_cell::sync::Lazy;
use regex::Regex;

/// `local@domain` addr-spec: dot-atom local part and a dotted domain of
/// letter/digit/hyphen labels. Quoted local parts and IP literals are not accepted.
static ADDR_SPEC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?(\.[A-Za-z0-9]([A-Za-z0-9-]*[A-Za-z0-9])?)*$",
    )
    .expect("address pattern compiles")
});

/// Character count within `min..=max`.
pub fn len_between(value: &str, min: usize, max: usize) -> bool {
    let len = value.chars().count();
    len >= min && len <= max
}

pub fn len_at_least(value: &str, min: usize) -> bool {
    value.chars().count() >= min
}

/// The `local@domain` part of a bare (`a@b.com`) or named (`Bob <a@b.com>`)
/// address, or `None` when it is not a valid address.
pub fn mailbox(email: &str) -> Option<&str> {
    let email = email.trim();
    let addr = match (email.rfind('<'), email.strip_suffix('>')) {
        (Some(open), Some(inner)) => &inner[open + 1..],
        (None, None) => email,
        _ => return None,
    };
    ADDR_SPEC.is_match(addr).then_some(addr)
}

pub fn is_valid_email(email: &str) -> bool {
    mailbox(email).is_some()
}
