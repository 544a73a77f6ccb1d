//! Identifier normalization for cross-engine comparison.
//!
//! SQL Server and PostgreSQL decorate object names differently: index and
//! constraint prefixes (`IX_`, `PK__`, `CK_`), auto-numbered check names,
//! underscore variance, and the 63-character identifier truncation on the
//! PostgreSQL side. The functions here fold those differences into stable
//! comparison keys. All of them are pure and total: malformed or empty input
//! produces an empty result, never an error, and each function is
//! idempotent.

/// Index name decorator prefixes stripped before comparison.
const INDEX_PREFIXES: [&str; 10] = [
    "ix_", "idxn", "idx", "pk__", "pk_", "uq__", "uq_", "ak__", "ak_", "unique_",
];

/// Check/default constraint decorator prefixes, stripped repeatedly.
const CONSTRAINT_PREFIXES: [&str; 4] = ["chk_", "ck_", "df_", "default_"];

/// Lowercases and trims an identifier.
pub fn normalize_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalized `schema.name` key.
pub fn normalize_fullname(schema: &str, name: &str) -> String {
    format!("{}.{}", normalize_name(schema), normalize_name(name))
}

/// Lowercases and removes underscores; tolerates underscore variance
/// between engines (`customer_id` vs `customerid`).
pub fn squash(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_lowercase()
}

/// Comparison key for index names: lowercased, decorator prefixes stripped,
/// underscores collapsed.
pub fn normalize_index_name(raw: &str) -> String {
    let mut name = normalize_name(raw);
    for prefix in INDEX_PREFIXES {
        if let Some(stripped) = name.strip_prefix(prefix) {
            name = stripped.to_string();
            break;
        }
    }
    squash(&name)
}

/// Comparison key for check/default constraint names: lowercased, decorator
/// prefixes stripped repeatedly, a trailing `_<digits>` auto-number suffix
/// removed, underscores collapsed.
pub fn normalize_constraint_name(raw: &str) -> String {
    let mut name = normalize_name(raw);
    loop {
        let mut stripped_any = false;
        for prefix in CONSTRAINT_PREFIXES {
            if let Some(stripped) = name.strip_prefix(prefix) {
                name = stripped.to_string();
                stripped_any = true;
            }
        }
        if !stripped_any {
            break;
        }
    }
    name = strip_trailing_counter(&name);
    squash(&name)
}

/// Removes one trailing `_<digits>` suffix (engine-appended disambiguating
/// counter on auto-named constraints).
fn strip_trailing_counter(name: &str) -> String {
    if let Some(pos) = name.rfind('_') {
        let tail = &name[pos + 1..];
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            return name[..pos].to_string();
        }
    }
    name.to_string()
}

/// Schema comparison key. `dbo` on SQL Server and `public` on PostgreSQL are
/// the engines' default homes for migrated objects and fold to the same key;
/// every other schema name is expected to survive migration verbatim.
pub fn fold_default_schema(schema: &str) -> String {
    let normalized = normalize_name(schema);
    if normalized == "dbo" || normalized == "public" {
        String::new()
    } else {
        normalized
    }
}

/// Splits a comma-joined column list into a sorted, lowercased set for
/// order-independent comparison. Empty input yields an empty list.
pub fn normalize_column_list(csv: &str) -> Vec<String> {
    let mut columns: Vec<String> = csv
        .split(',')
        .map(|c| normalize_name(c))
        .filter(|c| !c.is_empty())
        .collect();
    columns.sort();
    columns.dedup();
    columns
}

/// Removes one trailing `_insert` / `_update` / `_delete` event-action
/// suffix, so a single SOURCE trigger firing on multiple events matches the
/// per-event triggers PostgreSQL migrations commonly split it into.
pub fn strip_event_suffix(name: &str) -> String {
    let lower = normalize_name(name);
    for suffix in ["_insert", "_update", "_delete"] {
        if let Some(stripped) = lower.strip_suffix(suffix) {
            return stripped.to_string();
        }
    }
    lower
}

/// Fuzzy equivalence for names that may be truncated or decorated: equal, or
/// one contains the other (covers prefix and suffix truncation). Empty names
/// only match by equality so a blank never claims a real entity.
pub fn names_equivalent(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return a == b;
    }
    a == b || a.contains(b) || b.contains(a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Orders "), "orders");
        assert_eq!(normalize_name(""), "");
    }

    #[test]
    fn test_normalize_fullname() {
        assert_eq!(normalize_fullname("DBO", " Orders"), "dbo.orders");
    }

    #[test]
    fn test_squash() {
        assert_eq!(squash("Customer_ID"), "customerid");
        assert_eq!(squash("__"), "");
    }

    #[test]
    fn test_normalize_index_name_strips_prefixes() {
        assert_eq!(normalize_index_name("IX_Orders_CustomerId"), "orderscustomerid");
        assert_eq!(normalize_index_name("PK__Orders__3214EC07"), "orders3214ec07");
        assert_eq!(normalize_index_name("uq_email"), "email");
        assert_eq!(normalize_index_name("plain"), "plain");
    }

    #[test]
    fn test_normalize_constraint_name() {
        assert_eq!(normalize_constraint_name("CK_Price_Positive"), "pricepositive");
        assert_eq!(normalize_constraint_name("df_orders_status_42"), "ordersstatus");
        // Stacked prefixes are stripped repeatedly.
        assert_eq!(normalize_constraint_name("chk_ck_amount"), "amount");
        // A non-numeric tail is not a counter.
        assert_eq!(normalize_constraint_name("ck_amount_x2"), "amountx2");
    }

    #[test]
    fn test_normalizers_are_idempotent() {
        for raw in [
            "IX_Orders_CustomerId",
            "CK_Price_Positive_12",
            "df_orders_status_42",
            "  Mixed_Case ",
            "",
        ] {
            let once = normalize_index_name(raw);
            assert_eq!(normalize_index_name(&once), once, "index: {raw:?}");

            let once = normalize_constraint_name(raw);
            assert_eq!(normalize_constraint_name(&once), once, "constraint: {raw:?}");

            let once = normalize_name(raw);
            assert_eq!(normalize_name(&once), once, "name: {raw:?}");
        }
    }

    #[test]
    fn test_fold_default_schema() {
        assert_eq!(fold_default_schema("DBO"), fold_default_schema("public"));
        assert_eq!(fold_default_schema("Sales"), "sales");
        assert_ne!(fold_default_schema("sales"), fold_default_schema("public"));
    }

    #[test]
    fn test_normalize_column_list() {
        assert_eq!(
            normalize_column_list("B, a ,c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
        assert_eq!(normalize_column_list(""), Vec::<String>::new());
        assert_eq!(normalize_column_list(",,"), Vec::<String>::new());
    }

    #[test]
    fn test_strip_event_suffix() {
        assert_eq!(strip_event_suffix("trg_audit_insert"), "trg_audit");
        assert_eq!(strip_event_suffix("TRG_AUDIT_UPDATE"), "trg_audit");
        assert_eq!(strip_event_suffix("trg_audit"), "trg_audit");
        // Only one suffix comes off.
        assert_eq!(strip_event_suffix("t_delete_insert"), "t_delete");
    }

    #[test]
    fn test_names_equivalent() {
        assert!(names_equivalent("ixorders", "ixorders"));
        // PostgreSQL 63-char truncation leaves a prefix of the source name.
        assert!(names_equivalent("averylongindexname", "averylongindex"));
        assert!(names_equivalent("orders", "ix_orders_customer"));
        assert!(!names_equivalent("orders", "customers"));
        assert!(!names_equivalent("", "orders"));
        assert!(names_equivalent("", ""));
    }
}
