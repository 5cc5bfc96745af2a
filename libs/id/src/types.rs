//! Typed ID definitions for pitchhub records.

use crate::define_id;

// =============================================================================
// Stored records
// =============================================================================

define_id!(UserId, "usr");
define_id!(EventRecordId, "evt");
define_id!(EnrollmentId, "enr");
define_id!(GrantId, "grt");

// =============================================================================
// Requests
// =============================================================================

define_id!(RequestId, "req");

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_event_record_id_prefix() {
        let id = EventRecordId::new();
        assert!(id.to_string().starts_with("evt_"));
    }

    #[test]
    fn test_enrollment_id_roundtrip() {
        let id = EnrollmentId::new();
        let parsed: EnrollmentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_grant_id_rejects_foreign_prefix() {
        let err = "enr_01HV4Z2WQXKJNM8GPQY6VBKC3D"
            .parse::<GrantId>()
            .unwrap_err();
        assert!(err.is_prefix_error());
    }

    #[test]
    fn test_user_id_missing_separator() {
        let err = "usr01HV4Z2WQXKJNM8GPQY6VBKC3D".parse::<UserId>().unwrap_err();
        assert_eq!(err, crate::IdError::MissingSeparator);
    }

    #[test]
    fn test_empty_id() {
        assert_eq!("".parse::<UserId>().unwrap_err(), crate::IdError::Empty);
    }

    #[test]
    fn test_invalid_ulid() {
        assert!(matches!(
            "req_not-a-ulid".parse::<RequestId>().unwrap_err(),
            crate::IdError::InvalidUlid(_)
        ));
    }

    #[test]
    fn test_id_serializes_as_string() {
        let id = UserId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }

    #[test]
    fn test_ids_are_time_ordered() {
        let first = EnrollmentId::new();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = EnrollmentId::new();
        assert!(first < second);
    }

    #[test]
    fn test_all_id_prefixes_unique() {
        let prefixes = [
            UserId::PREFIX,
            EventRecordId::PREFIX,
            EnrollmentId::PREFIX,
            GrantId::PREFIX,
            RequestId::PREFIX,
        ];
        let unique: std::collections::HashSet<_> = prefixes.iter().collect();
        assert_eq!(prefixes.len(), unique.len(), "Duplicate ID prefixes found!");
    }

    proptest! {
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = input.parse::<EventRecordId>();
        }

        #[test]
        fn unprefixed_input_is_rejected(input in "[a-z]{1,3}_[0-9A-Z]{26}") {
            prop_assume!(!input.starts_with("evt_"));
            prop_assert!(input.parse::<EventRecordId>().is_err());
        }
    }
}
