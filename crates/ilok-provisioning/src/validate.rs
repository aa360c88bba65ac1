//! Metadata Validation
//!
//! Pure validation rules for the two metadata values every licensable item
//! must carry. Keeping these free of logging and I/O lets both the deposit
//! and renewal paths share them verbatim.

use ilok_commerce::MetaValue;

/// Minimum length of a plausible SKU GUID after trimming
pub const SKU_GUID_MIN_LEN: usize = 10;

/// Validate a SKU GUID metadata value
///
/// Only textual values qualify. The value is trimmed first; anything shorter
/// than [`SKU_GUID_MIN_LEN`] is rejected as a placeholder or typo rather than
/// a real catalog GUID. Returns the trimmed GUID.
pub fn validate_sku_guid(value: &MetaValue) -> Option<String> {
    let text = match value {
        MetaValue::Text(s) => s.trim(),
        _ => return None,
    };

    if text.len() < SKU_GUID_MIN_LEN {
        return None;
    }

    Some(text.to_string())
}

/// Validate a licensing account id metadata value
///
/// Accounts arrive as checkout text or as numeric user ids, so both forms
/// coerce to a trimmed non-empty string.
pub fn validate_account_id(value: &MetaValue) -> Option<String> {
    let text = value.coerce_text()?;
    let text = text.trim();

    if text.is_empty() {
        return None;
    }

    Some(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sku_guid_minimum_length() {
        assert_eq!(
            validate_sku_guid(&MetaValue::text("abcdefghij")),
            Some("abcdefghij".to_string())
        );
        assert_eq!(validate_sku_guid(&MetaValue::text("abcdefghi")), None);
    }

    #[test]
    fn test_sku_guid_trimmed_before_length_check() {
        // Padding does not rescue a short GUID.
        assert_eq!(validate_sku_guid(&MetaValue::text("  abcdefgh  ")), None);
        assert_eq!(
            validate_sku_guid(&MetaValue::text("  abcdefghij  ")),
            Some("abcdefghij".to_string())
        );
    }

    #[test]
    fn test_sku_guid_must_be_text() {
        assert_eq!(validate_sku_guid(&MetaValue::Integer(1234567890)), None);
        assert_eq!(
            validate_sku_guid(&MetaValue::list::<Vec<String>, _>(vec!["abcdefghij".into()])),
            None
        );
    }

    #[test]
    fn test_account_id_accepts_text_and_numbers() {
        assert_eq!(
            validate_account_id(&MetaValue::text("  ilokuser42  ")),
            Some("ilokuser42".to_string())
        );
        assert_eq!(
            validate_account_id(&MetaValue::Integer(42)),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_account_id_rejects_blank_and_lists() {
        assert_eq!(validate_account_id(&MetaValue::text("   ")), None);
        assert_eq!(
            validate_account_id(&MetaValue::list::<Vec<String>, _>(vec!["user".into()])),
            None
        );
    }
}
