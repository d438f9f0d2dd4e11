//! Identifier sanitizer: remote field labels -> collision-free Rust-friendly identifiers.
//!
//! Field names are kept in lower camel case (`accountNameID`) because they are persisted in the
//! catalog snapshot; generated members use their snake form (`account_name_id`).

use crate::translit;
use std::collections::HashSet;

/// Upper camel case: "last name" -> "LastName", "e-mail" -> "EMail". Letters after the first of each
/// word keep their case.
pub fn upper_camel_case(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    let mut word_start = true;
    for c in label.chars() {
        let mut ascii = String::new();
        if !translit::push_ascii(c, &mut ascii) {
            word_start = true;
            continue;
        }
        for a in ascii.chars() {
            if !a.is_ascii_alphanumeric() {
                word_start = true;
                continue;
            }
            if word_start {
                out.push(a.to_ascii_uppercase());
                word_start = false;
            } else {
                out.push(a);
            }
        }
    }
    out
}

/// Lower camel case. A leading run of capitals is lowered as one acronym ("ID" -> "id",
/// "URLField" -> "urlField").
pub fn lower_camel_case(label: &str) -> String {
    let upper: Vec<char> = upper_camel_case(label).chars().collect();
    let run = upper.iter().take_while(|c| c.is_ascii_uppercase()).count();
    let lower_until = if run > 1 && upper.get(run).map_or(false, |c| c.is_ascii_lowercase()) {
        run - 1
    } else {
        run.max(1)
    };
    upper
        .iter()
        .enumerate()
        .map(|(i, c)| if i < lower_until { c.to_ascii_lowercase() } else { *c })
        .collect()
}

/// Identifier for a field label: lower camel case, never empty, never starting with a digit.
pub fn to_identifier(label: &str) -> String {
    let ident = lower_camel_case(label);
    match ident.chars().next() {
        None => "field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("field{}", ident),
        Some(_) => ident,
    }
}

/// Type name for a module label. Names that cannot start a Rust type get a `Crm` prefix.
pub fn to_type_name(label: &str) -> String {
    let name = upper_camel_case(label);
    match name.chars().next() {
        Some(c) if c.is_ascii_alphabetic() && name != "Self" => name,
        _ => format!("Crm{}", name),
    }
}

/// camelCase identifier -> snake_case. Acronyms stay grouped: "accountNameID" -> "account_name_id",
/// and a trailing plural `s` stays on its acronym: "watchersUserIDs" -> "watchers_user_ids".
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next = chars.get(i + 1).copied();
            let plural_tail = next == Some('s') && i + 2 == chars.len();
            let boundary = match prev {
                None | Some('_') => false,
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) => {
                    p.is_ascii_uppercase() && next.map_or(false, |n| n.is_ascii_lowercase()) && !plural_tail
                }
            };
            if boundary {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    s != "_" && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "crate", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let",
    "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return",
    "self", "Self", "static", "struct", "super", "trait", "true", "try", "type", "typeof", "unsafe",
    "unsized", "use", "virtual", "where", "while", "yield",
];

pub fn is_rust_keyword(s: &str) -> bool {
    RUST_KEYWORDS.contains(&s)
}

/// Member names every generated object already carries (system fields and the object contract).
const RESERVED_MEMBERS: &[&str] = &[
    "id",
    "system",
    "system_mut",
    "created_time",
    "modified_time",
    "last_activity_time",
    "created_by",
    "created_by_id",
    "created_by_name",
    "modified_by",
    "modified_by_id",
    "modified_by_name",
    "owner",
    "owner_id",
    "owner_name",
    "last_record",
    "field",
    "set_field",
    "is_dirty",
    "set_dirty",
    "has_id",
    "new",
    "default",
];

/// Names taken within one generation pass, compared by generated member (snake) form so that
/// `accountName` and `account_name` collide. Each name also claims its setter and change-flag
/// member.
#[derive(Clone, Debug, Default)]
pub struct UsedNames {
    members: HashSet<String>,
}

impl UsedNames {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seeded with the members every generated object carries.
    pub fn with_reserved() -> Self {
        let mut used = Self::new();
        for name in RESERVED_MEMBERS {
            used.members.insert((*name).to_string());
        }
        used
    }

    pub fn contains(&self, name: &str) -> bool {
        member_forms(name).iter().any(|m| self.members.contains(m))
    }

    /// Claim `name`. Returns false if it (or one of its derived members) was already taken.
    pub fn insert(&mut self, name: &str) -> bool {
        if self.contains(name) {
            return false;
        }
        for m in member_forms(name) {
            self.members.insert(m);
        }
        true
    }
}

fn member_forms(name: &str) -> [String; 3] {
    let snake = to_snake_case(name);
    [format!("set_{}", snake), format!("dirty_{}", snake), snake]
}

/// Sanitize `label` and make it unique against `used` by appending `_2`, `_3`, ...; the result is
/// claimed in `used`. Deterministic for a given label order.
pub fn unique_identifier(label: &str, used: &mut UsedNames) -> String {
    let base = to_identifier(label);
    if used.insert(&base) {
        return base;
    }
    let mut n = 2u32;
    loop {
        let candidate = format!("{}_{}", base, n);
        if used.insert(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn labels_become_lower_camel_identifiers() {
        assert_eq!(to_identifier("Last Name"), "lastName");
        assert_eq!(to_identifier("Account Name_ID"), "accountNameID");
        assert_eq!(to_identifier("E-mail"), "eMail");
        assert_eq!(to_identifier("ID"), "id");
        assert_eq!(to_identifier("URL Field"), "urlField");
        assert_eq!(to_identifier("Prénom"), "prenom");
        assert_eq!(to_identifier("Имя клиента"), "imyaKlienta");
    }

    #[test]
    fn unusable_labels_get_a_prefix() {
        assert_eq!(to_identifier("2nd Phone"), "field2ndPhone");
        assert_eq!(to_identifier("%%%"), "field");
        assert_eq!(to_type_name("3D Models"), "Crm3DModels");
        assert_eq!(to_type_name("Sales Orders"), "SalesOrders");
    }

    #[test]
    fn snake_case_groups_acronyms() {
        assert_eq!(to_snake_case("accountNameID"), "account_name_id");
        assert_eq!(to_snake_case("lastName"), "last_name");
        assert_eq!(to_snake_case("urlField"), "url_field");
        assert_eq!(to_snake_case("field2ndPhone"), "field2nd_phone");
        assert_eq!(to_snake_case("lastName_2"), "last_name_2");
        assert_eq!(to_snake_case("HTMLBody"), "html_body");
    }

    #[test]
    fn trailing_plural_acronyms_stay_whole() {
        assert_eq!(to_snake_case("watchersUserIDs"), "watchers_user_ids");
        assert_eq!(to_snake_case("URLs"), "urls");
        assert_eq!(to_identifier("Watchers_UserIDs"), "watchersUserIDs");
    }

    #[test]
    fn duplicates_get_numbered_suffixes() {
        let mut used = UsedNames::new();
        assert_eq!(unique_identifier("Phone", &mut used), "phone");
        assert_eq!(unique_identifier("phone", &mut used), "phone_2");
        assert_eq!(unique_identifier("PHONE", &mut used), "phone_3");
    }

    #[test]
    fn reserved_members_are_never_reused() {
        let mut used = UsedNames::with_reserved();
        assert_eq!(unique_identifier("Owner", &mut used), "owner_2");
        assert_eq!(unique_identifier("Created Time", &mut used), "createdTime_2");
    }

    #[test]
    fn setter_names_are_claimed_too() {
        let mut used = UsedNames::new();
        assert_eq!(unique_identifier("Status", &mut used), "status");
        assert_eq!(unique_identifier("Set Status", &mut used), "setStatus_2");
    }

    #[test]
    fn keywords_are_recognised() {
        assert!(is_rust_keyword("type"));
        assert!(!is_rust_keyword("kind"));
        assert!(is_valid_identifier("lastName_2"));
        assert!(!is_valid_identifier("2x"));
    }

    proptest! {
        #[test]
        fn unique_identifier_is_distinct_and_deterministic(labels in prop::collection::vec("[a-zA-Z0-9 _éж-]{0,12}", 0..40)) {
            let run = |labels: &[String]| {
                let mut used = UsedNames::with_reserved();
                labels.iter().map(|l| unique_identifier(l, &mut used)).collect::<Vec<_>>()
            };
            let first = run(&labels);
            let second = run(&labels);
            prop_assert_eq!(&first, &second);
            let snakes: HashSet<String> = first.iter().map(|n| to_snake_case(n)).collect();
            prop_assert_eq!(snakes.len(), first.len());
            for name in &first {
                prop_assert!(is_valid_identifier(name));
            }
        }
    }
}
