use retail_core::types::CustomerRecord;
use retail_pii::{mask, mask_into, mask_record, unmask, SubstitutionTable};

fn customer() -> CustomerRecord {
    CustomerRecord {
        id: 1,
        name: "Alice Johnson".to_string(),
        phone: "+1-555-0101".to_string(),
        email: Some("alice@example.com".to_string()),
        address: Some("100 W 42nd St, New York, NY".to_string()),
        location: None,
        preferred_drink: Some("Caramel Latte".to_string()),
        loyalty_level: Some("Gold".to_string()),
        recent_orders: vec![],
        active_coupons: vec![],
    }
}

#[test]
fn message_round_trip_through_reply() {
    let (masked, table) = mask("Call me at +1-555-0101 or email alice@example.com");

    assert_eq!(masked, "Call me at [PHONE_1] or email [EMAIL_1]");
    assert_eq!(table.len(), 2);
    assert_eq!(table.get("[PHONE_1]"), Some("+1-555-0101"));
    assert_eq!(table.get("[EMAIL_1]"), Some("alice@example.com"));

    let reply = unmask("Sure, we'll contact you at [PHONE_1].", &table);
    assert_eq!(reply, "Sure, we'll contact you at +1-555-0101.");
}

#[test]
fn unmask_restores_original_text() {
    let samples = [
        "My number is (555) 123-4567 and backup is 555.987.6543",
        "Contact: alice@company.com or phone 5551234567",
        "+1 (555) 123-4567, bob.smith+coffee@mail.example.org, +44 555 0199",
        "ok +1 555 0101 222 3333 444 5555",
        "+1-555-0101-2345 then 555 123 4567 8901",
        "call (555) 123-4567 89 or 0123456789, ids 1234567890123",
        "x@y.com5551234567 and 555.123.4567.8901@z.io",
        "no pii here at all",
        "",
    ];
    for original in samples {
        let (masked, table) = mask(original);
        assert_eq!(unmask(&masked, &table), original, "round trip of {original:?}");
    }
}

#[test]
fn later_rule_still_sees_digits_next_to_a_claimed_phone() {
    // "101 222 3333" overlaps the first phone, but "333 444 5555" does not.
    let (masked, table) = mask("ok +1 555 0101 222 3333 444 5555");

    assert_eq!(masked, "ok [PHONE_1] 222 3[PHONE_2]");
    assert_eq!(table.get("[PHONE_1]"), Some("+1 555 0101"));
    assert_eq!(table.get("[PHONE_2]"), Some("333 444 5555"));
}

#[test]
fn repeated_literal_gets_one_placeholder() {
    let (masked, table) = mask("a@b.io, a@b.io and 555-123-4567 / 555-123-4567");

    assert_eq!(masked, "[EMAIL_1], [EMAIL_1] and [PHONE_1] / [PHONE_1]");
    assert_eq!(table.len(), 2);
    assert!(!masked.contains("555"));
}

#[test]
fn masking_is_idempotent_on_placeholders() {
    let (once, table) = mask("reach [PHONE_1] or x@y.com");
    let (twice, second) = mask(&once);

    assert_eq!(once, "reach [PHONE_1] or [EMAIL_1]");
    assert_eq!(twice, once);
    assert!(second.is_empty());
    assert_eq!(unmask(&once, &table), "reach [PHONE_1] or x@y.com");
}

#[test]
fn existing_placeholder_text_is_never_reused() {
    let original = "literal [PHONE_1] then 555-123-4567";
    let (masked, table) = mask(original);

    assert_eq!(masked, "literal [PHONE_1] then [PHONE_2]");
    assert_eq!(unmask(&masked, &table), original);
}

#[test]
fn bare_ten_digit_numbers_are_masked_even_when_not_phones() {
    // Known limitation: an order id that happens to be 10 digits looks like a phone.
    let (masked, table) = mask("order 1234567890 is ready");
    assert_eq!(masked, "order [PHONE_1] is ready");
    assert_eq!(table.get("[PHONE_1]"), Some("1234567890"));

    // Eleven digits do not match.
    let (masked, _) = mask("order 12345678901 is ready");
    assert_eq!(masked, "order 12345678901 is ready");
}

#[test]
fn record_masks_only_contact_fields() {
    let original = customer();
    let (masked, table) = mask_record(&original);

    assert_eq!(masked.phone, "[PHONE_1]");
    assert_eq!(masked.email.as_deref(), Some("[EMAIL_1]"));
    assert_eq!(masked.name, original.name);
    assert_eq!(masked.address, original.address);
    assert_eq!(table.get("[EMAIL_1]"), Some("alice@example.com"));
}

#[test]
fn shared_table_reuses_placeholders_across_sources() {
    let mut table = SubstitutionTable::new();
    let message = mask_into("text me on 555-000-1111, not +1-555-0101", &mut table);
    let record = retail_pii::mask_record_into(&customer(), &mut table);

    assert_eq!(message, "text me on [PHONE_2], not [PHONE_1]");
    assert_eq!(record.phone, "[PHONE_1]");
    assert_eq!(record.email.as_deref(), Some("[EMAIL_1]"));
    assert_eq!(table.len(), 3);
    assert_eq!(
        unmask("[PHONE_1] / [PHONE_2] / [EMAIL_1]", &table),
        "+1-555-0101 / 555-000-1111 / alice@example.com"
    );
}
